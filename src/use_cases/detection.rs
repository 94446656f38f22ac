// Detection-rate stage: classify each hand reading and smooth the fingertip.

use super::types::GestureState;
use crate::domain::tuning::{AimTuning, GestureTuning};
use crate::domain::{HandReading, Smoother, classify};
use tracing::{debug, info, trace};

/// One detection cycle: folds a reading into the published gesture state.
pub trait HandObserver: Send {
    fn observe(&mut self, reading: &HandReading) -> GestureState;
}

pub struct GestureTracker {
    tuning: GestureTuning,
    smoother: Smoother,
    state: GestureState,
}

impl GestureTracker {
    pub fn new(tuning: GestureTuning, aim: &AimTuning) -> Self {
        Self {
            tuning,
            smoother: Smoother::new(aim.detection_smoothing),
            state: GestureState::default(),
        }
    }

    /// Folds one reading into the published state and returns the new value.
    pub fn observe(&mut self, reading: &HandReading) -> GestureState {
        self.state.seq += 1;

        match reading {
            HandReading::NoHand => {
                if self.state.hand_present {
                    self.state.losses += 1;
                    info!(losses = self.state.losses, "hand lost");
                }
                // The smoothed point is kept; `is_aiming = false` keeps it from being used.
                self.state.hand_present = false;
                self.state.is_aiming = false;
                self.state.is_thumb_up = true;
                self.state.confidence = 0.0;
            }
            HandReading::Hand(frame) => {
                if !self.state.hand_present {
                    debug!("hand acquired");
                }
                let verdict = classify(frame, &self.tuning);
                let aim_point = self.smoother.update(verdict.fingertip);
                trace!(
                    aiming = verdict.is_aim_gesture,
                    thumb_up = verdict.is_thumb_up,
                    confidence = verdict.confidence,
                    "hand classified"
                );

                self.state.hand_present = true;
                self.state.is_aiming = verdict.is_aim_gesture;
                self.state.is_thumb_up = verdict.is_thumb_up;
                self.state.aim_point = aim_point;
                self.state.confidence = verdict.confidence;
            }
        }

        self.state
    }

    pub fn state(&self) -> GestureState {
        self.state
    }
}

impl HandObserver for GestureTracker {
    fn observe(&mut self, reading: &HandReading) -> GestureState {
        GestureTracker::observe(self, reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::classifier::fixtures::{finger_gun, open_palm};
    use glam::Vec2;

    fn tracker() -> GestureTracker {
        GestureTracker::new(GestureTuning::default(), &AimTuning::default())
    }

    #[test]
    fn publishes_the_classified_pose() {
        let mut tracker = tracker();
        let state = tracker.observe(&HandReading::Hand(finger_gun(true)));

        assert!(state.hand_present);
        assert!(state.is_aiming);
        assert!(state.is_thumb_up);
        assert_eq!(state.seq, 1);
        assert_eq!(state.aim_point, Vec2::new(0.47, 0.36));
    }

    #[test]
    fn losing_the_hand_drops_the_aim_but_keeps_the_point() {
        let mut tracker = tracker();
        tracker.observe(&HandReading::Hand(finger_gun(false)));
        let state = tracker.observe(&HandReading::NoHand);

        assert!(!state.hand_present);
        assert!(!state.is_aiming);
        assert!(state.is_thumb_up);
        assert_eq!(state.losses, 1);
        assert_eq!(state.aim_point, Vec2::new(0.47, 0.36));

        // Repeated "no hand" is still one loss.
        assert_eq!(tracker.observe(&HandReading::NoHand).losses, 1);
        assert_eq!(tracker.state().seq, 3);
    }

    #[test]
    fn fingertip_is_smoothed_across_cycles() {
        let mut tracker = tracker();
        tracker.observe(&HandReading::Hand(finger_gun(true)));
        let state = tracker.observe(&HandReading::Hand(open_palm()));

        // Open palm index tip is at (0.44, 0.34); 40% of the way from (0.47, 0.36).
        assert!((state.aim_point - Vec2::new(0.458, 0.352)).length() < 1e-5);
        assert!(!state.is_aiming);
    }
}

// Thumb-drop trigger: turns the continuous thumb reading into single fire events.

use serde::Serialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TriggerState {
    /// No aim gesture (or no hand).
    Idle,
    /// Aim gesture held, ready to fire.
    Aiming,
    /// Fired recently; thumb edges are ignored until the cooldown passes.
    Cooldown,
}

/// Edge detector over `is_thumb_up`, fed once per detection sample.
///
/// Cooldown is a deadline in session time rather than a scheduled callback, so a newer shot simply
/// moves the deadline and a reset drops it.
#[derive(Debug, Clone)]
pub struct TriggerDetector {
    state: TriggerState,
    was_thumb_up: bool,
    /// Cleared on tracking loss; set again once a thumb-up reading is seen. A thumb that is
    /// already down when the hand reappears must not fire.
    armed: bool,
    cooldown: Duration,
    shooting_until: Option<Duration>,
}

impl TriggerDetector {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            state: TriggerState::Idle,
            was_thumb_up: true,
            armed: false,
            cooldown,
            shooting_until: None,
        }
    }

    /// Returns true exactly once per up-to-down thumb transition while aiming.
    pub fn on_sample(&mut self, is_aiming: bool, is_thumb_up: bool, now: Duration) -> bool {
        self.tick(now);

        let edge = self.was_thumb_up && !is_thumb_up;
        self.was_thumb_up = is_thumb_up;
        if is_thumb_up {
            self.armed = true;
        }

        if !is_aiming {
            self.set_state(TriggerState::Idle);
            return false;
        }

        if self.state == TriggerState::Idle {
            let next = if self.is_shooting(now) {
                TriggerState::Cooldown
            } else {
                TriggerState::Aiming
            };
            self.set_state(next);
        }

        if self.state != TriggerState::Aiming || !edge || !self.armed {
            return false;
        }

        self.shooting_until = Some(now + self.cooldown);
        self.set_state(TriggerState::Cooldown);
        true
    }

    /// Expires the cooldown once its deadline has passed.
    pub fn tick(&mut self, now: Duration) {
        let Some(until) = self.shooting_until else {
            return;
        };
        if now < until {
            return;
        }
        self.shooting_until = None;
        if self.state == TriggerState::Cooldown {
            self.set_state(TriggerState::Aiming);
        }
    }

    /// No hand means "thumb up": re-acquiring cannot fire off a stale thumb-down reading.
    pub fn on_tracking_lost(&mut self) {
        self.was_thumb_up = true;
        self.armed = false;
        self.set_state(TriggerState::Idle);
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.cooldown);
    }

    pub fn is_shooting(&self, now: Duration) -> bool {
        self.shooting_until.is_some_and(|until| now < until)
    }

    pub fn shooting_until(&self) -> Option<Duration> {
        self.shooting_until
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    fn set_state(&mut self, next: TriggerState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "trigger state");
            self.state = next;
        }
    }
}

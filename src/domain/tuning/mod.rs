// Gameplay tuning, kept apart from runtime configuration (tick rates, ports, buffer sizes).

pub mod aim;
pub mod scoring;
pub mod targets;

pub use aim::{AimTuning, GestureTuning, ScreenTuning};
pub use scoring::ScoringTuning;
pub use targets::{TargetKind, TargetTuning};

use crate::domain::errors::TuningError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on live targets a tuning file may ask for.
pub const MAX_TARGETS: usize = 64;

// Longest delay any timer is allowed to hold.
const MAX_MILLIS: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Every gameplay knob for one play session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameTuning {
    pub gesture: GestureTuning,
    pub aim: AimTuning,
    pub screen: ScreenTuning,
    pub targets: TargetTuning,
    pub scoring: ScoringTuning,
}

impl GameTuning {
    /// Rejects values the rules cannot run with: negative or non-finite durations, inverted
    /// ranges, empty viewports and oversized fields.
    pub fn validate(&self) -> Result<(), TuningError> {
        let aim = &self.aim;
        unit("aim.detection_smoothing", aim.detection_smoothing)?;
        unit("aim.crosshair_smoothing", aim.crosshair_smoothing)?;
        unit("aim.magnet_strength", aim.magnet_strength)?;
        non_negative("aim.capture_radius", aim.capture_radius)?;
        non_negative("aim.lock_hysteresis", aim.lock_hysteresis)?;
        non_negative("aim.shoot_cooldown_seconds", aim.shoot_cooldown_seconds)?;

        let screen = &self.screen;
        positive("screen.width", screen.width)?;
        positive("screen.height", screen.height)?;
        positive("screen.camera_distance", screen.camera_distance)?;
        if !(screen.fov_y_degrees > 0.0 && screen.fov_y_degrees < 180.0) {
            return Err(invalid("screen.fov_y_degrees", "must be between 0 and 180"));
        }

        let targets = &self.targets;
        if targets.max_count > MAX_TARGETS {
            return Err(invalid("targets.max_count", "too many targets"));
        }
        if !(targets.world_min.is_finite() && targets.world_max.is_finite()) {
            return Err(invalid("targets.world_min", "must be finite"));
        }
        if targets.world_min.cmpgt(targets.world_max).any() {
            return Err(invalid("targets.world_max", "must not be below world_min"));
        }
        non_negative("targets.min_separation", targets.min_separation)?;
        non_negative("targets.lifetime_seconds", targets.lifetime_seconds)?;
        non_negative("targets.max_spin", targets.max_spin)?;
        non_negative("targets.spawn_scale", targets.spawn_scale)?;
        non_negative("targets.spawn_ramp_seconds", targets.spawn_ramp_seconds)?;
        non_negative("targets.hit_respawn_delay_seconds", targets.hit_respawn_delay_seconds)?;
        non_negative("targets.startup_stagger_seconds", targets.startup_stagger_seconds)?;
        range("targets.drift_speed", targets.drift_speed)?;
        range("targets.bob_amplitude", targets.bob_amplitude)?;
        range("targets.bob_frequency", targets.bob_frequency)?;

        non_negative("scoring.combo_timeout_seconds", self.scoring.combo_timeout_seconds)?;
        Ok(())
    }
}

/// Seconds from a tuning field as a whole-millisecond `Duration`. Negative or NaN input is zero
/// and huge input saturates at a day.
pub fn seconds(value: f32) -> Duration {
    if value.is_nan() || value <= 0.0 {
        return Duration::ZERO;
    }
    let millis = (f64::from(value) * 1000.0).round().min(MAX_MILLIS);
    Duration::from_millis(millis as u64)
}

fn invalid(field: &'static str, reason: &'static str) -> TuningError {
    TuningError { field, reason }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be finite and not negative"))
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be finite and positive"))
    }
}

fn unit(field: &'static str, value: f32) -> Result<(), TuningError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, "must be between 0 and 1"))
    }
}

fn range(field: &'static str, (lo, hi): (f32, f32)) -> Result<(), TuningError> {
    non_negative(field, lo)?;
    non_negative(field, hi)?;
    if lo > hi {
        return Err(invalid(field, "lower bound above upper bound"));
    }
    Ok(())
}

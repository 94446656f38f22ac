use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetKind {
    /// Display color as 0xRRGGBB.
    pub color: u32,

    /// Base points before the combo multiplier.
    pub points: u32,
}

/// Gameplay tuning for the target field.
///
/// World units match the scene camera; times are in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetTuning {
    /// Live targets kept on the field.
    pub max_count: usize,

    /// Lower corner of the placement and drift volume.
    pub world_min: Vec3,

    /// Upper corner of the placement and drift volume.
    pub world_max: Vec3,

    /// Minimum distance between a new target and existing ones.
    pub min_separation: f32,

    /// Placement draws before overlap is accepted.
    pub placement_attempts: u32,

    /// Age after which an unhit target is relocated.
    pub lifetime_seconds: f32,

    /// Drift speed range in world units per second.
    pub drift_speed: (f32, f32),

    /// Bobbing amplitude range in world units.
    pub bob_amplitude: (f32, f32),

    /// Bobbing angular frequency range in radians per second.
    pub bob_frequency: (f32, f32),

    /// Maximum spin per axis in radians per second.
    pub max_spin: f32,

    /// Scale a target starts at when it spawns or relocates.
    pub spawn_scale: f32,

    /// Time for the spawn scale ramp to reach full size.
    pub spawn_ramp_seconds: f32,

    /// Delay before a hit target is replaced.
    pub hit_respawn_delay_seconds: f32,

    /// Spacing between spawns when the field is first filled.
    pub startup_stagger_seconds: f32,

    /// Target variants picked uniformly at spawn.
    pub kinds: Vec<TargetKind>,
}

impl Default for TargetTuning {
    fn default() -> Self {
        Self {
            max_count: 5,
            world_min: Vec3::new(-7.0, -3.5, -2.0),
            world_max: Vec3::new(7.0, 3.5, 1.0),
            min_separation: 2.0,
            placement_attempts: 20,
            lifetime_seconds: 8.0,
            drift_speed: (0.3, 0.9),
            bob_amplitude: (0.15, 0.35),
            bob_frequency: (1.0, 2.5),
            max_spin: 1.5,
            spawn_scale: 0.01,
            spawn_ramp_seconds: 0.25,
            hit_respawn_delay_seconds: 0.6,
            startup_stagger_seconds: 0.3,
            kinds: vec![
                TargetKind {
                    color: 0xff4d6d,
                    points: 100,
                },
                TargetKind {
                    color: 0x4dabf7,
                    points: 150,
                },
                TargetKind {
                    color: 0xffd43b,
                    points: 250,
                },
            ],
        }
    }
}

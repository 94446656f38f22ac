use serde::{Deserialize, Serialize};

/// Gameplay tuning for hand-pose classification.
///
/// Thresholds are in normalized landmark units unless stated otherwise.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureTuning {
    /// Index finger counts as extended when tip-to-PIP over PIP-to-MCP exceeds this.
    pub extended_ratio: f32,

    /// Other fingers count as folded when tip-to-wrist over MCP-to-wrist is below this.
    pub folded_ratio: f32,

    /// How many of middle/ring/pinky must be folded for the aim pose.
    pub min_folded: usize,

    /// Vertical gap the thumb tip must clear above its IP joint to read as "up".
    pub thumb_up_offset: f32,

    /// Joint distances below this are treated as degenerate.
    pub min_joint_distance: f32,
}

impl Default for GestureTuning {
    fn default() -> Self {
        Self {
            extended_ratio: 0.8,
            folded_ratio: 1.3,
            min_folded: 2,
            thumb_up_offset: 0.02,
            min_joint_distance: 1e-4,
        }
    }
}

/// Gameplay tuning for crosshair motion, magnetism and the trigger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AimTuning {
    /// Blend factor applied once per detection cycle to the raw fingertip.
    pub detection_smoothing: f32,

    /// Blend factor applied once per render frame to the displayed crosshair.
    pub crosshair_smoothing: f32,

    /// On-screen distance in pixels within which a target can be locked.
    pub capture_radius: f32,

    /// Pull toward a target sitting exactly under the aim point (0..=1).
    pub magnet_strength: f32,

    /// Extra pixels of stickiness granted to the current lock. 0 recomputes the lock from scratch
    /// every frame.
    pub lock_hysteresis: f32,

    /// Seconds after a shot during which further trigger edges are ignored.
    pub shoot_cooldown_seconds: f32,
}

impl Default for AimTuning {
    fn default() -> Self {
        Self {
            detection_smoothing: 0.4,
            crosshair_smoothing: 0.12,
            capture_radius: 120.0,
            magnet_strength: 0.4,
            lock_hysteresis: 0.0,
            shoot_cooldown_seconds: 0.2,
        }
    }
}

/// Screen and camera model shared with the renderer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenTuning {
    /// Viewport width in pixels.
    pub width: f32,

    /// Viewport height in pixels.
    pub height: f32,

    /// Mirror the camera image horizontally (selfie view).
    pub mirror_x: bool,

    /// Vertical field of view of the scene camera, in degrees.
    pub fov_y_degrees: f32,

    /// Distance of the scene camera from the world origin along +Z.
    pub camera_distance: f32,
}

impl Default for ScreenTuning {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            mirror_x: true,
            fov_y_degrees: 60.0,
            camera_distance: 10.0,
        }
    }
}

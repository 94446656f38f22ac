// Ports for the collaborators around the core: renderer, audio and HUD.
// Implementations live in the interface adapters; the session only sees these traits.

use crate::domain::scoring::ScoreSnapshot;
use crate::domain::targets::TargetId;
use crate::domain::trigger::TriggerState;
use glam::{Vec2, Vec3};
use serde::Serialize;

/// Camera model owned by the rendering collaborator.
pub trait Projector: Send {
    fn project_to_screen(&self, world: Vec3) -> Vec2;
    /// Point on the target plane (`z = 0`) under a screen pixel.
    fn unproject_to_world(&self, screen: Vec2) -> Vec3;
}

// The serialization within this layer is a dependency leak, but it keeps the wire DTOs thin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "level")]
pub enum AudioCue {
    Shoot,
    Hit,
    PerfectHit,
    Miss,
    Combo(u32),
    LockAcquired,
}

/// Fire-and-forget sound triggers. No ordering guarantee against visual effects.
pub trait AudioSink {
    fn play(&mut self, cue: AudioCue);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetVisual {
    pub id: TargetId,
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: f32,
    pub color: u32,
    pub points: u32,
}

/// Entity lifecycle and effects, keyed by target id. The renderer owns the visuals.
pub trait SceneSink {
    fn spawn_entity(&mut self, visual: &TargetVisual);
    fn remove_entity(&mut self, id: TargetId);
    fn update_transform(&mut self, id: TargetId, position: Vec3, rotation: Vec3, scale: f32);
    fn hit_effect(&mut self, position: Vec3, color: u32, perfect: bool);
    fn miss_effect(&mut self, position: Vec3);
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HudSnapshot {
    #[serde(flatten)]
    pub score: ScoreSnapshot,
    pub crosshair: Vec2,
    pub locked_target: Option<TargetId>,
    pub is_aiming: bool,
    /// Classifier confidence in the current pose, 0 without a hand.
    pub confidence: f32,
    pub is_shooting: bool,
    pub trigger: TriggerState,
}

/// Display-only consumer of session state. Nothing flows back.
pub trait Presentation {
    fn show(&mut self, hud: &HudSnapshot);
}

// Use-case level inputs/outputs for the detection and frame drivers.

use crate::domain::{
    AudioCue, AudioSink, HudSnapshot, Presentation, SceneSink, TargetId, TargetVisual,
};
use glam::{Vec2, Vec3};

/// Latest classified hand state, published by the detection driver and read by the frame driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureState {
    pub hand_present: bool,
    pub is_aiming: bool,
    pub is_thumb_up: bool,
    /// Smoothed fingertip in normalized camera coordinates.
    pub aim_point: Vec2,
    pub confidence: f32,
    /// Detection cycles published so far; a change means a new sample.
    pub seq: u64,
    /// Tracking losses so far. Survives the cell being overwritten before the frame driver reads it.
    pub losses: u64,
}

impl Default for GestureState {
    fn default() -> Self {
        Self {
            hand_present: false,
            is_aiming: false,
            is_thumb_up: true,
            aim_point: Vec2::splat(0.5),
            confidence: 0.0,
            seq: 0,
            losses: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Pause,
    Resume,
    Restart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Paused,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneCommand {
    Spawn(TargetVisual),
    Remove {
        id: TargetId,
    },
    Transform {
        id: TargetId,
        position: Vec3,
        rotation: Vec3,
        scale: f32,
    },
    HitEffect {
        position: Vec3,
        color: u32,
        perfect: bool,
    },
    MissEffect {
        position: Vec3,
    },
}

/// Everything one render frame produced for the collaborators.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub tick: u64,
    pub hud: Option<HudSnapshot>,
    pub cues: Vec<AudioCue>,
    pub scene: Vec<SceneCommand>,
}

impl FrameReport {
    pub fn new(tick: u64) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }
}

impl AudioSink for FrameReport {
    fn play(&mut self, cue: AudioCue) {
        self.cues.push(cue);
    }
}

impl SceneSink for FrameReport {
    fn spawn_entity(&mut self, visual: &TargetVisual) {
        self.scene.push(SceneCommand::Spawn(visual.clone()));
    }

    fn remove_entity(&mut self, id: TargetId) {
        self.scene.push(SceneCommand::Remove { id });
    }

    fn update_transform(&mut self, id: TargetId, position: Vec3, rotation: Vec3, scale: f32) {
        self.scene.push(SceneCommand::Transform {
            id,
            position,
            rotation,
            scale,
        });
    }

    fn hit_effect(&mut self, position: Vec3, color: u32, perfect: bool) {
        self.scene.push(SceneCommand::HitEffect {
            position,
            color,
            perfect,
        });
    }

    fn miss_effect(&mut self, position: Vec3) {
        self.scene.push(SceneCommand::MissEffect { position });
    }
}

impl Presentation for FrameReport {
    fn show(&mut self, hud: &HudSnapshot) {
        self.hud = Some(*hud);
    }
}

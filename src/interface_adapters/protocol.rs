// Wire protocol DTOs and conversions for the detection bridge websocket.

use crate::domain::tuning::ScreenTuning;
use crate::domain::{
    AudioCue, GameTuning, HudSnapshot, Landmark, LandmarkError, LandmarkFrame, StartupError,
    TargetId, TargetVisual,
};
use crate::use_cases::{FrameReport, RunState, SceneCommand};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Messages the server sends to the client over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    // Session accepted; carries everything the client needs to render the same scene.
    Welcome(WelcomeDto),
    // Startup failure. The socket closes right after.
    Fatal(FatalDto),
    // Output of one render frame.
    Frame(FrameDto),
    RunState(RunStateDto),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    // First message: camera startup result and viewport size.
    Hello(HelloPayload),
    Landmarks(LandmarksPayload),
    NoHand,
    Pause,
    Resume,
    Restart,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelloPayload {
    pub camera: CameraStatusDto,
    #[serde(default)]
    pub viewport: Option<ViewportDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CameraStatusDto {
    Ready,
    Unavailable {
        #[serde(default)]
        reason: String,
    },
    Denied {
        #[serde(default)]
        reason: String,
    },
}

impl CameraStatusDto {
    pub fn into_result(self) -> Result<(), StartupError> {
        match self {
            CameraStatusDto::Ready => Ok(()),
            CameraStatusDto::Unavailable { reason } => {
                Err(StartupError::CameraUnavailable { reason })
            }
            CameraStatusDto::Denied { reason } => Err(StartupError::CameraDenied { reason }),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ViewportDto {
    pub width: f32,
    pub height: f32,
}

impl ViewportDto {
    /// Usable only when both sides are finite and positive.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// One detection result: 21 normalized landmarks in model order.
#[derive(Debug, Clone, Deserialize)]
pub struct LandmarksPayload {
    pub points: Vec<Landmark>,
}

impl TryFrom<LandmarksPayload> for LandmarkFrame {
    type Error = LandmarkError;

    fn try_from(payload: LandmarksPayload) -> Result<Self, Self::Error> {
        LandmarkFrame::from_slice(&payload.points)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WelcomeDto {
    pub session_id: String,
    pub tuning: GameTuning,
    pub camera: CameraDto,
}

/// Camera model the server projects with, so the client draws targets where they are aimed at.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CameraDto {
    pub fov_y_degrees: f32,
    pub distance: f32,
    pub width: f32,
    pub height: f32,
    pub mirror_x: bool,
}

impl From<&ScreenTuning> for CameraDto {
    fn from(screen: &ScreenTuning) -> Self {
        Self {
            fov_y_degrees: screen.fov_y_degrees,
            distance: screen.camera_distance,
            width: screen.width,
            height: screen.height,
            mirror_x: screen.mirror_x,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FatalDto {
    pub kind: &'static str,
    pub message: String,
}

impl From<&StartupError> for FatalDto {
    fn from(err: &StartupError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameDto {
    pub tick: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hud: Option<HudSnapshot>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cues: Vec<AudioCue>,
    pub scene: Vec<SceneCommandDto>,
}

impl From<FrameReport> for FrameDto {
    fn from(report: FrameReport) -> Self {
        Self {
            tick: report.tick,
            hud: report.hud,
            cues: report.cues,
            scene: report.scene.into_iter().map(SceneCommandDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SceneCommandDto {
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

impl From<SceneCommand> for SceneCommandDto {
    fn from(command: SceneCommand) -> Self {
        match command {
            SceneCommand::Spawn(visual) => SceneCommandDto::Spawn(visual),
            SceneCommand::Remove { id } => SceneCommandDto::Remove { id },
            SceneCommand::Transform {
                id,
                position,
                rotation,
                scale,
            } => SceneCommandDto::Transform {
                id,
                position,
                rotation,
                scale,
            },
            SceneCommand::HitEffect {
                position,
                color,
                perfect,
            } => SceneCommandDto::HitEffect {
                position,
                color,
                perfect,
            },
            SceneCommand::MissEffect { position } => SceneCommandDto::MissEffect { position },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStateDto {
    Running,
    Paused,
}

impl From<RunState> for RunStateDto {
    fn from(state: RunState) -> Self {
        match state {
            RunState::Running => RunStateDto::Running,
            RunState::Paused => RunStateDto::Paused,
        }
    }
}

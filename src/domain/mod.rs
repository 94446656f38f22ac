// Domain layer: gesture, aiming, target and scoring rules.

pub mod classifier;
pub mod errors;
pub mod landmarks;
pub mod magnet;
pub mod ports;
pub mod scoring;
pub mod smoothing;
pub mod targets;
pub mod trigger;
pub mod tuning;

pub use classifier::{GestureVerdict, classify};
pub use errors::{LandmarkError, StartupError, TuningError};
pub use landmarks::{HandReading, Landmark, LandmarkFrame};
pub use ports::{AudioCue, AudioSink, HudSnapshot, Presentation, Projector, SceneSink, TargetVisual};
pub use scoring::{HitOutcome, HitTier, ScoreSnapshot, Scoreboard};
pub use smoothing::Smoother;
pub use targets::{RegistryEvent, Target, TargetId, TargetRegistry};
pub use trigger::{TriggerDetector, TriggerState};
pub use tuning::GameTuning;

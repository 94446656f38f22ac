// Use cases layer: the play session and the loops that drive it.

pub mod detection;
pub mod game;
pub mod session;
#[cfg(test)]
pub(crate) mod test_support;
pub mod types;

pub use game::{GameHandle, GameSettings, spawn_game};
pub use session::{FrameSink, GameSession, SessionState, ShotOutcome};
pub use types::{ControlCommand, FrameReport, GestureState, RunState, SceneCommand};

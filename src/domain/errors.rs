// Domain-level errors for landmark intake and session start.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum LandmarkError {
    WrongCount { expected: usize, actual: usize },
    NonFinite { index: usize },
}

impl fmt::Display for LandmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LandmarkError::WrongCount { expected, actual } => {
                write!(f, "expected {expected} landmarks, got {actual}")
            }
            LandmarkError::NonFinite { index } => {
                write!(f, "landmark {index} has a non-finite coordinate")
            }
        }
    }
}

impl std::error::Error for LandmarkError {}

/// Failures that stop a play session from starting. Everything after start is recovered per frame.
#[derive(Debug, Clone, PartialEq)]
pub enum StartupError {
    CameraUnavailable { reason: String },
    CameraDenied { reason: String },
}

impl StartupError {
    /// Stable identifier clients use to pick the message they show.
    pub fn kind(&self) -> &'static str {
        match self {
            StartupError::CameraUnavailable { .. } => "camera_unavailable",
            StartupError::CameraDenied { .. } => "camera_denied",
        }
    }
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::CameraUnavailable { reason } => {
                write!(f, "no camera available: {reason}")
            }
            StartupError::CameraDenied { reason } => {
                write!(f, "camera permission denied: {reason}")
            }
        }
    }
}

impl std::error::Error for StartupError {}

/// A tuning value outside the range the game rules can run with.
#[derive(Debug, Clone, PartialEq)]
pub struct TuningError {
    pub field: &'static str,
    pub reason: &'static str,
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

impl std::error::Error for TuningError {}

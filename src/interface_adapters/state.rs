use crate::use_cases::GameSettings;

/// Shared by every connection. Each connection clones the template into its own session.
#[derive(Debug, Clone)]
pub struct AppState {
    // Tuning, seed and loop timing for new sessions.
    pub session_template: GameSettings,
}

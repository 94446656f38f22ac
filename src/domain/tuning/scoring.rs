use serde::{Deserialize, Serialize};

/// Gameplay tuning for combos and scoring.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTuning {
    /// Maximum gap between hits that keeps a streak alive, in seconds.
    pub combo_timeout_seconds: f32,

    /// Highest combo multiplier.
    pub max_combo: u32,

    /// Combo level from which a hit counts as "perfect".
    pub perfect_combo: u32,
}

impl Default for ScoringTuning {
    fn default() -> Self {
        Self {
            combo_timeout_seconds: 2.0,
            max_combo: 10,
            perfect_combo: 5,
        }
    }
}

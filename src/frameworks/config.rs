use crate::domain::{GameTuning, TuningError};
use std::{
    env, fmt, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("SHOOTER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

/// Optional TOML file overriding gameplay tuning.
pub fn tuning_path() -> Option<PathBuf> {
    env::var_os("SHOOTER_TUNING_PATH")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Fixed RNG seed for target placement. Unset or unparsable means entropy.
pub fn seed() -> Option<u64> {
    parse_seed(env::var("SHOOTER_SEED").ok().as_deref())
}

pub fn parse_seed(raw: Option<&str>) -> Option<u64> {
    raw.map(str::trim).and_then(|v| v.parse().ok())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

pub fn log_format() -> LogFormat {
    match env::var("LOG_FORMAT").as_deref() {
        Ok("json") => LogFormat::Json,
        _ => LogFormat::Compact,
    }
}

pub const READING_CHANNEL_CAPACITY: usize = 32;
pub const CONTROL_CHANNEL_CAPACITY: usize = 16;
pub const FRAME_BROADCAST_CAPACITY: usize = 128;

pub const FRAME_INTERVAL: Duration = Duration::from_millis(1000 / 60);
pub const DETECTION_INTERVAL: Duration = Duration::from_millis(30);
// A frame never covers more than this, however long the task was stalled.
pub const MAX_FRAME_STEP: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    Invalid { path: PathBuf, source: TuningError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read tuning file {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "invalid tuning file {}: {source}", path.display())
            }
            ConfigError::Invalid { path, source } => {
                write!(f, "rejected tuning in {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Invalid { source, .. } => Some(source),
        }
    }
}

/// Defaults, overridden by `SHOOTER_TUNING_PATH` when set.
pub fn load_tuning() -> Result<GameTuning, ConfigError> {
    match tuning_path() {
        Some(path) => load_tuning_from(&path),
        None => Ok(GameTuning::default()),
    }
}

pub fn load_tuning_from(path: &Path) -> Result<GameTuning, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let tuning = parse_tuning(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tuning.validate().map_err(|source| ConfigError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(tuning)
}

/// Missing tables and fields keep their defaults.
pub fn parse_tuning(text: &str) -> Result<GameTuning, toml::de::Error> {
    toml::from_str(text)
}

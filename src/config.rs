//! Runtime configuration: where the data files live and how loud to log
//!
//! Preferences the user changes while the widget runs (interval, auto-start,
//! window position) are part of the progress state, not of this module.

use std::env;
use std::path::{Path, PathBuf};
use tracing::Level as TraceLevel;

use crate::constants::paths;

/// Resolved locations of every file the widget reads or writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub words_txt: PathBuf,
    pub words_json: PathBuf,
    pub state_file: PathBuf,
}

impl AppPaths {
    /// Priority: `--data-dir` > `WOTD_DATA_DIR` > platform config dir > `.`
    pub fn resolve(cli_override: Option<PathBuf>) -> Self {
        Self::resolve_from(cli_override, env::var(paths::DATA_DIR_ENV).ok())
    }

    fn resolve_from(cli_override: Option<PathBuf>, env_override: Option<String>) -> Self {
        let data_dir = cli_override
            .or_else(|| env_override.filter(|v| !v.trim().is_empty()).map(PathBuf::from))
            .unwrap_or_else(Self::default_data_dir);
        Self::in_dir(data_dir)
    }

    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            words_txt: data_dir.join(paths::WORDS_TXT),
            words_json: data_dir.join(paths::WORDS_JSON),
            state_file: data_dir.join(paths::STATE_FILE),
            data_dir,
        }
    }

    fn default_data_dir() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(paths::APP_DIR);
        path
    }
}

/// Log level from `LOG_LEVEL`, defaulting to info
pub fn log_level_from_env() -> TraceLevel {
    parse_log_level(&env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()))
}

fn parse_log_level(raw: &str) -> TraceLevel {
    match raw.trim().to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

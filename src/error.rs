//! Error kinds at the file I/O boundary
//!
//! Nothing here is ever fatal: callers pick the documented fallback and log.

use std::path::PathBuf;
use thiserror::Error;

/// Vocabulary source read/write failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read vocabulary from {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write vocabulary to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Progress state read/write failures
#[derive(Debug, Error)]
pub enum StateError {
    #[error("no saved state at {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt state in {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

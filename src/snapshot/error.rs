//! Error types for snapshot construction.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a tree build.
///
/// Per-file problems never surface here; they are folded into the file's
/// content instead.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Watch root {path} is not accessible: {source}")]
    RootUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Watch root {path} is not a directory")]
    RootNotDirectory { path: PathBuf },

    #[error("Failed to walk {path}: {reason}")]
    WalkFailed { path: PathBuf, reason: String },
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

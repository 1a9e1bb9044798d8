//! Change notifications and the outcomes of processing them.

use std::fmt;
use std::path::PathBuf;

/// A raw "path modified" notification from an event source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub is_dir: bool,
}

impl ChangeEvent {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
        }
    }

    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
        }
    }
}

/// Which lookup produced a skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStage {
    Before,
    After,
}

impl fmt::Display for CaptureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureStage::Before => f.write_str("before rebuild"),
            CaptureStage::After => f.write_str("after rebuild"),
        }
    }
}

/// Why the diff step did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The path crosses an excluded directory or names an excluded file.
    Excluded,
    /// The path is absent from the snapshot or outside the watch root.
    NotFound,
    /// The path resolved to a directory.
    NotAFile,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Excluded => f.write_str("path is excluded from tracking"),
            SkipReason::NotFound => f.write_str("path not found in the snapshot"),
            SkipReason::NotAFile => f.write_str("path is not a file"),
        }
    }
}

/// Result of feeding one event through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Directory notifications are dropped before the debounce gate.
    IgnoredDirectory,
    /// Arrived within the debounce interval of the last accepted event.
    Debounced,
    /// The tree was rebuilt but no diff was taken.
    Skipped {
        path: String,
        stage: CaptureStage,
        reason: SkipReason,
    },
    /// A batch was appended to the commit cache. `changes` may be zero when
    /// the content is line-identical.
    Recorded { path: String, changes: usize },
}

impl ProcessOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, ProcessOutcome::Recorded { .. })
    }
}

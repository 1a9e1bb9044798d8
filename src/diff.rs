//! Line-level diff between two snapshots of a file.
//!
//! Both sides are split into lines and aligned with `similar`; only the
//! lines unique to one side are kept, in edit-script order.

use std::fmt;

use serde::{Serialize, Serializer};
use similar::{Algorithm, ChangeTag, TextDiff};

use crate::config::DiffAlgorithm;

/// A changed line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DiffLine {
    Added(String),
    Removed(String),
}

impl DiffLine {
    pub fn text(&self) -> &str {
        match self {
            DiffLine::Added(text) | DiffLine::Removed(text) => text,
        }
    }

    pub fn is_added(&self) -> bool {
        matches!(self, DiffLine::Added(_))
    }
}

impl fmt::Display for DiffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffLine::Added(text) => write!(f, "+ {text}"),
            DiffLine::Removed(text) => write!(f, "- {text}"),
        }
    }
}

impl Serialize for DiffLine {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The changed lines from one diff run.
pub type DiffBatch = Vec<DiffLine>;

/// Convert `DiffAlgorithm` config enum to `similar::Algorithm`
#[must_use]
pub const fn config_to_algorithm(algo: DiffAlgorithm) -> Algorithm {
    match algo {
        DiffAlgorithm::Myers => Algorithm::Myers,
        DiffAlgorithm::Patience => Algorithm::Patience,
    }
}

/// Computes line diffs with a fixed alignment algorithm.
#[derive(Debug, Clone, Copy)]
pub struct DiffEngine {
    algorithm: Algorithm,
}

impl DiffEngine {
    pub fn new(algorithm: DiffAlgorithm) -> Self {
        Self {
            algorithm: config_to_algorithm(algorithm),
        }
    }

    /// Diff `old` against `new`.
    ///
    /// Empty exactly when both texts have the same lines. A trailing newline
    /// on either side does not count as a change.
    pub fn diff(&self, old: &str, new: &str) -> DiffBatch {
        let old_lines: Vec<&str> = old.lines().collect();
        let new_lines: Vec<&str> = new.lines().collect();

        let diff = TextDiff::configure()
            .algorithm(self.algorithm)
            .diff_slices(old_lines.as_slice(), new_lines.as_slice());

        diff.iter_all_changes()
            .filter_map(|change| match change.tag() {
                ChangeTag::Delete => Some(DiffLine::Removed(change.value().to_string())),
                ChangeTag::Insert => Some(DiffLine::Added(change.value().to_string())),
                ChangeTag::Equal => None,
            })
            .collect()
    }
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new(DiffAlgorithm::default())
    }
}

/// Number of added and removed lines in a batch.
pub fn line_counts(batch: &[DiffLine]) -> (usize, usize) {
    let added = batch.iter().filter(|line| line.is_added()).count();
    (added, batch.len() - added)
}

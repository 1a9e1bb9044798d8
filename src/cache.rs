//! Per-path accumulation of diff batches.

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::diff::DiffBatch;

/// Snapshot of the cache contents: path -> batches in recording order.
pub type CommitEntries = IndexMap<String, Vec<DiffBatch>>;

/// Append-only store of diff batches, keyed by root-relative path.
///
/// Paths keep the order in which they were first recorded. Nothing is ever
/// evicted, merged or deduplicated; two identical batches for one path are
/// stored twice.
#[derive(Debug, Default)]
pub struct CommitCache {
    entries: RwLock<CommitEntries>,
}

impl CommitCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch for `path`.
    pub fn store(&self, path: impl Into<String>, batch: DiffBatch) {
        self.entries.write().entry(path.into()).or_default().push(batch);
    }

    /// Copy of everything recorded so far.
    pub fn all_entries(&self) -> CommitEntries {
        self.entries.read().clone()
    }

    /// Copy of the batches recorded for one path.
    pub fn entries_for(&self, path: &str) -> Option<Vec<DiffBatch>> {
        self.entries.read().get(path).cloned()
    }

    /// Number of distinct paths.
    pub fn path_count(&self) -> usize {
        self.entries.read().len()
    }

    /// Number of batches across all paths.
    pub fn batch_count(&self) -> usize {
        self.entries.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

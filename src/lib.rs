pub mod cache;
pub mod cli;
pub mod config;
pub mod diff;
pub mod logging;
pub mod snapshot;
pub mod summary;
pub mod watcher;

pub use cache::{CommitCache, CommitEntries};
pub use config::{DiffAlgorithm, Settings, SummaryConfig, WatchConfig};
pub use diff::{DiffBatch, DiffEngine, DiffLine};
pub use snapshot::{
    FileRepr, Lookup, PathFilter, ROOT_SENTINEL, SnapshotError, SnapshotNode, SnapshotTree,
};
pub use summary::{ChatSummarizer, Summarizer, SummaryError};
pub use watcher::{
    ChangeDebouncer, ChangeEvent, ChangeProcessor, FsEventSource, ProcessOutcome, WatchError,
};

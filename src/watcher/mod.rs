//! Change-processing pipeline.
//!
//! # Architecture
//!
//! ```text
//! FsEventSource (notify, background thread)
//!        |  crossbeam channel of ChangeEvent
//!        v
//! ChangeProcessor
//!   - ChangeDebouncer gate (global)
//!   - SnapshotTree lookup (before)
//!   - SnapshotTree rebuild
//!   - SnapshotTree lookup (after)
//!   - DiffEngine
//!   - CommitCache::store
//! ```
//!
//! Any producer of `ChangeEvent`s can drive the processor; the notify
//! source is one of them.

mod debouncer;
mod error;
mod event;
mod processor;
mod source;

pub use debouncer::ChangeDebouncer;
pub use error::WatchError;
pub use event::{CaptureStage, ChangeEvent, ProcessOutcome, SkipReason};
pub use processor::ChangeProcessor;
pub use source::FsEventSource;

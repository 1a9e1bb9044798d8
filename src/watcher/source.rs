//! Filesystem event source backed by `notify`.

use std::path::Path;

use crossbeam_channel::{Receiver, Sender, bounded};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecursiveMode, Watcher};

use super::error::WatchError;
use super::event::ChangeEvent;

/// Recursive watch on a root directory.
///
/// Content and rename modifications are forwarded as [`ChangeEvent`]s in
/// the order `notify` delivers them. Metadata-only changes, creations,
/// removals and access events are dropped. Dropping the source stops the
/// watch and closes the channel.
pub struct FsEventSource {
    /// The underlying file watcher (kept alive by storing it).
    _watcher: notify::RecommendedWatcher,
}

impl FsEventSource {
    /// Start watching `root` and return the receiving end of the event
    /// channel.
    pub fn start(root: &Path, capacity: usize) -> Result<(Self, Receiver<ChangeEvent>), WatchError> {
        let (tx, rx) = bounded(capacity.max(1));

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => forward(event, &tx),
                Err(e) => tracing::error!("[watcher] file watch error: {e}"),
            }
        })?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: root.to_path_buf(),
                reason: e.to_string(),
            })?;

        crate::log_event!("watcher", "watching", "{}", root.display());

        Ok((Self { _watcher: watcher }, rx))
    }
}

/// True for event kinds that may change file content.
fn is_content_change(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Modify(modify) if !matches!(modify, ModifyKind::Metadata(_)))
}

fn forward(event: Event, tx: &Sender<ChangeEvent>) {
    if !is_content_change(&event.kind) {
        return;
    }
    for path in event.paths {
        let is_dir = path.is_dir();
        if tx.send(ChangeEvent { path, is_dir }).is_err() {
            // Receiver gone; the processor has shut down.
            return;
        }
    }
}

//! The change pipeline: debounce, capture, rebuild, capture, diff, record.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::Receiver;
use parking_lot::{Mutex, RwLock};

use crate::cache::CommitCache;
use crate::config::WatchConfig;
use crate::diff::DiffEngine;
use crate::snapshot::{BuildStats, FileRepr, Lookup, PathFilter, SnapshotTree};

use super::debouncer::ChangeDebouncer;
use super::error::WatchError;
use super::event::{CaptureStage, ChangeEvent, ProcessOutcome, SkipReason};

/// Owns the snapshot, the debounce state and a handle to the commit cache.
///
/// Each resource sits behind its own lock. The tree lock is held for the
/// whole capture/rebuild/capture sequence so readers never observe the
/// "before" value of one event paired with the "after" of another.
pub struct ChangeProcessor {
    /// Watch root as given.
    root: PathBuf,
    /// Canonical form of the root; event sources may report either form.
    canonical_root: Option<PathBuf>,
    filter: Arc<PathFilter>,
    tree: RwLock<SnapshotTree>,
    debouncer: Mutex<ChangeDebouncer>,
    engine: DiffEngine,
    cache: Arc<CommitCache>,
}

impl ChangeProcessor {
    /// Create a processor with an empty tree. Call [`construct`](Self::construct)
    /// before feeding events, otherwise the first event has nothing to
    /// compare against.
    pub fn new(root: impl Into<PathBuf>, config: &WatchConfig) -> Self {
        let root = root.into();
        let canonical_root = fs::canonicalize(&root).ok();
        let filter = Arc::new(PathFilter::from_config(config));

        Self {
            root,
            canonical_root,
            tree: RwLock::new(SnapshotTree::empty(Arc::clone(&filter))),
            filter,
            debouncer: Mutex::new(ChangeDebouncer::new(config.debounce())),
            engine: DiffEngine::new(config.diff_algorithm),
            cache: Arc::new(CommitCache::new()),
        }
    }

    /// Share an existing cache instead of the processor's own.
    pub fn with_cache(mut self, cache: Arc<CommitCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Build the initial snapshot.
    ///
    /// On failure the current tree stays installed.
    pub fn construct(&self) -> Result<BuildStats, WatchError> {
        let tree = SnapshotTree::build(&self.root, Arc::clone(&self.filter))?;
        let stats = tree.stats();
        *self.tree.write() = tree;

        crate::log_event!(
            "processor",
            "snapshot",
            "{} files in {} directories",
            stats.files,
            stats.directories
        );
        Ok(stats)
    }

    /// Run one event through the pipeline as observed at `now`.
    ///
    /// Excluded and missing paths are reported as [`ProcessOutcome::Skipped`].
    /// Only a failed rebuild is an error, and it leaves the previous tree
    /// in place.
    pub fn process(&self, event: &ChangeEvent, now: Instant) -> Result<ProcessOutcome, WatchError> {
        if event.is_dir {
            return Ok(ProcessOutcome::IgnoredDirectory);
        }

        if !self.debouncer.lock().accept(now) {
            return Ok(ProcessOutcome::Debounced);
        }

        let Some(path) = self.relative_path(&event.path) else {
            return Ok(ProcessOutcome::Skipped {
                path: event.path.display().to_string(),
                stage: CaptureStage::Before,
                reason: SkipReason::NotFound,
            });
        };

        let (before, after) = {
            let mut tree = self.tree.write();
            let before = capture(&tree, &path);
            *tree = SnapshotTree::build(&self.root, Arc::clone(&self.filter))?;
            let after = capture(&tree, &path);
            (before, after)
        };

        let before = match before {
            Ok(repr) => repr,
            Err(reason) => {
                return Ok(ProcessOutcome::Skipped {
                    path,
                    stage: CaptureStage::Before,
                    reason,
                });
            }
        };
        let after = match after {
            Ok(repr) => repr,
            Err(reason) => {
                return Ok(ProcessOutcome::Skipped {
                    path,
                    stage: CaptureStage::After,
                    reason,
                });
            }
        };

        let batch = self.engine.diff(&before.content, &after.content);
        let changes = batch.len();
        self.cache.store(path.clone(), batch);

        Ok(ProcessOutcome::Recorded { path, changes })
    }

    /// Process an event stamped with the current time and log the outcome.
    pub fn handle(&self, event: &ChangeEvent) -> Result<ProcessOutcome, WatchError> {
        let outcome = self.process(event, Instant::now());

        match &outcome {
            Ok(ProcessOutcome::Recorded { path, changes }) => {
                crate::log_event!("processor", "recorded", "{path} ({changes} changed lines)");
            }
            Ok(ProcessOutcome::Skipped {
                path,
                stage,
                reason,
            }) => {
                tracing::warn!("[processor] no diff for {path} ({stage}): {reason}");
            }
            Ok(ProcessOutcome::Debounced) => {
                crate::debug_event!("processor", "debounced", "{}", event.path.display());
            }
            Ok(ProcessOutcome::IgnoredDirectory) => {
                crate::debug_event!("processor", "directory ignored", "{}", event.path.display());
            }
            Err(e) => {
                tracing::error!("[processor] {}: {e}", event.path.display());
            }
        }

        outcome
    }

    /// Consume events in delivery order until every sender is dropped.
    ///
    /// Errors are logged and do not stop the loop.
    pub fn run(&self, events: Receiver<ChangeEvent>) {
        let interval = self.debouncer.lock().interval();
        crate::log_event!(
            "processor",
            "started",
            "{} (debounce {}ms)",
            self.root.display(),
            interval.as_millis()
        );
        for event in events.iter() {
            let _ = self.handle(&event);
        }
        crate::log_event!("processor", "stopped");
    }

    /// Root-relative, slash-separated form of an event path.
    ///
    /// A relative path that starts with a relative root is taken from the
    /// same working directory and has the root stripped; any other relative
    /// path is taken as already relative to the root. Absolute paths outside
    /// the root give `None`.
    pub fn relative_path(&self, path: &Path) -> Option<String> {
        let relative = if path.is_absolute() {
            path.strip_prefix(&self.root)
                .ok()
                .or_else(|| {
                    self.canonical_root
                        .as_deref()
                        .and_then(|root| path.strip_prefix(root).ok())
                })?
        } else if self.root.is_relative() {
            path.strip_prefix(&self.root).unwrap_or(path)
        } else {
            path
        };

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(name) => segments.push(name.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(segments.join("/"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache(&self) -> &Arc<CommitCache> {
        &self.cache
    }

    /// Current file repr at `path`, if tracked.
    pub fn current_file(&self, path: &str) -> Option<Arc<FileRepr>> {
        self.tree.read().file(path)
    }

    pub fn tracked_files(&self) -> usize {
        self.tree.read().file_count()
    }

    /// Pretty JSON of the current tree.
    pub fn tree_json(&self) -> Result<String, serde_json::Error> {
        self.tree.read().to_json_pretty()
    }
}

/// Resolve `path` to a file repr, or say why it can't be diffed.
fn capture(tree: &SnapshotTree, path: &str) -> Result<Arc<FileRepr>, SkipReason> {
    match tree.lookup(path) {
        Lookup::Found(node) => node.as_file().cloned().ok_or(SkipReason::NotAFile),
        Lookup::Excluded => Err(SkipReason::Excluded),
        Lookup::NotFound => Err(SkipReason::NotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn config(debounce_ms: u64) -> WatchConfig {
        WatchConfig {
            debounce_ms,
            ..WatchConfig::default()
        }
    }

    #[test]
    fn test_relative_path_forms() {
        let temp = TempDir::new().unwrap();
        let processor = ChangeProcessor::new(temp.path(), &config(0));

        assert_eq!(
            processor.relative_path(&temp.path().join("src").join("a.txt")),
            Some("src/a.txt".to_string())
        );
        assert_eq!(
            processor.relative_path(Path::new("./src/a.txt")),
            Some("src/a.txt".to_string())
        );
        assert_eq!(processor.relative_path(Path::new("/definitely/elsewhere")), None);
        assert_eq!(processor.relative_path(Path::new("../escape.txt")), None);
    }

    #[test]
    fn test_relative_root_prefix_stripped() {
        let processor = ChangeProcessor::new("proj", &config(0));

        assert_eq!(
            processor.relative_path(Path::new("proj/a.txt")),
            Some("a.txt".to_string())
        );
        assert_eq!(
            processor.relative_path(Path::new("proj/src/b.txt")),
            Some("src/b.txt".to_string())
        );
        assert_eq!(
            processor.relative_path(Path::new("a.txt")),
            Some("a.txt".to_string())
        );
    }

    #[test]
    fn test_directory_event_ignored_before_gate() {
        let temp = TempDir::new().unwrap();
        let processor = ChangeProcessor::new(temp.path(), &config(10_000));
        processor.construct().unwrap();
        let now = Instant::now();

        let outcome = processor.process(&ChangeEvent::dir(temp.path()), now).unwrap();
        assert_eq!(outcome, ProcessOutcome::IgnoredDirectory);

        // The gate was not consumed by the directory event
        let outcome = processor
            .process(&ChangeEvent::file(temp.path().join("x.txt")), now)
            .unwrap();
        assert_ne!(outcome, ProcessOutcome::Debounced);
    }

    #[test]
    fn test_records_diff_and_debounces() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("notes.txt");
        fs::write(&file, "one\ntwo\n").unwrap();

        let processor = ChangeProcessor::new(temp.path(), &config(1000));
        processor.construct().unwrap();
        assert_eq!(processor.tracked_files(), 1);

        fs::write(&file, "one\nthree\n").unwrap();
        let t = Instant::now();
        let outcome = processor.process(&ChangeEvent::file(&file), t).unwrap();
        assert_eq!(
            outcome,
            ProcessOutcome::Recorded {
                path: "notes.txt".to_string(),
                changes: 2
            }
        );

        fs::write(&file, "four\n").unwrap();
        let outcome = processor
            .process(&ChangeEvent::file(&file), t + Duration::from_millis(999))
            .unwrap();
        assert_eq!(outcome, ProcessOutcome::Debounced);
        assert_eq!(processor.cache().batch_count(), 1);
        // Dropped events leave the tree alone
        assert_eq!(processor.current_file("notes.txt").unwrap().content, "one\nthree\n");
    }

    #[test]
    fn test_new_file_skipped_before_but_tracked_after() {
        let temp = TempDir::new().unwrap();
        let processor = ChangeProcessor::new(temp.path(), &config(0));
        processor.construct().unwrap();

        let file = temp.path().join("fresh.txt");
        fs::write(&file, "new").unwrap();
        let outcome = processor.process(&ChangeEvent::file(&file), Instant::now()).unwrap();

        assert_eq!(
            outcome,
            ProcessOutcome::Skipped {
                path: "fresh.txt".to_string(),
                stage: CaptureStage::Before,
                reason: SkipReason::NotFound
            }
        );
        assert!(processor.cache().is_empty());
        assert_eq!(processor.current_file("fresh.txt").unwrap().content, "new");
    }

    #[test]
    fn test_deleted_file_skipped_after() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("gone.txt");
        fs::write(&file, "bye").unwrap();

        let processor = ChangeProcessor::new(temp.path(), &config(0));
        processor.construct().unwrap();
        fs::remove_file(&file).unwrap();

        let outcome = processor.process(&ChangeEvent::file(&file), Instant::now()).unwrap();
        assert!(matches!(
            outcome,
            ProcessOutcome::Skipped {
                stage: CaptureStage::After,
                reason: SkipReason::NotFound,
                ..
            }
        ));
        assert!(processor.cache().is_empty());
    }

    #[test]
    fn test_excluded_path_reported() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("node_modules")).unwrap();
        let file = temp.path().join("node_modules").join("index.js");
        fs::write(&file, "x").unwrap();

        let processor = ChangeProcessor::new(temp.path(), &config(0));
        processor.construct().unwrap();

        let outcome = processor.process(&ChangeEvent::file(&file), Instant::now()).unwrap();
        assert!(matches!(
            outcome,
            ProcessOutcome::Skipped {
                reason: SkipReason::Excluded,
                ..
            }
        ));
    }

    #[test]
    fn test_directory_path_as_file_event() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();

        let processor = ChangeProcessor::new(temp.path(), &config(0));
        processor.construct().unwrap();

        // Some sources report directories without the flag
        let outcome = processor
            .process(&ChangeEvent::file(temp.path().join("src")), Instant::now())
            .unwrap();
        assert!(matches!(
            outcome,
            ProcessOutcome::Skipped {
                reason: SkipReason::NotAFile,
                ..
            }
        ));
    }

    #[test]
    fn test_vanished_root_keeps_previous_tree() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("project");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("a.txt"), "a").unwrap();

        let processor = ChangeProcessor::new(&root, &config(0));
        processor.construct().unwrap();
        fs::remove_dir_all(&root).unwrap();

        let result = processor.process(&ChangeEvent::file(root.join("a.txt")), Instant::now());
        assert!(matches!(result, Err(WatchError::Snapshot(_))));
        assert_eq!(processor.current_file("a.txt").unwrap().content, "a");
    }
}

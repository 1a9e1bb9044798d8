//! Recursive snapshot of a watched directory.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

use super::error::{SnapshotError, SnapshotResult};
use super::filter::PathFilter;
use super::node::{FileRepr, Lookup, ROOT_SENTINEL, SnapshotNode};

/// Counters collected while building a tree.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    pub directories: usize,
    pub files: usize,
    /// Files stored with a diagnostic instead of their content.
    pub unreadable: usize,
    /// Entries dropped by the exclusion filter.
    pub excluded: usize,
    /// Directories skipped because their canonical path was already visited.
    pub cycles_skipped: usize,
}

/// In-memory snapshot of every tracked file under a root.
///
/// A tree is never patched. Each build produces a complete replacement.
#[derive(Debug, Clone)]
pub struct SnapshotTree {
    root: SnapshotNode,
    filter: Arc<PathFilter>,
    stats: BuildStats,
}

impl SnapshotTree {
    /// A tree with no entries. Every lookup below the root is `NotFound`.
    pub fn empty(filter: Arc<PathFilter>) -> Self {
        Self {
            root: SnapshotNode::empty_dir(),
            filter,
            stats: BuildStats::default(),
        }
    }

    /// Walk `root` depth first and capture every tracked file.
    ///
    /// Symlinks are followed. A directory is entered at most once per build,
    /// keyed by its canonical path, so link cycles terminate. Only problems
    /// with the root itself are errors; unreadable entries below it are
    /// recorded with a diagnostic.
    pub fn build(root: &Path, filter: Arc<PathFilter>) -> SnapshotResult<Self> {
        let canonical_root =
            fs::canonicalize(root).map_err(|source| SnapshotError::RootUnavailable {
                path: root.to_path_buf(),
                source,
            })?;
        if !canonical_root.is_dir() {
            return Err(SnapshotError::RootNotDirectory {
                path: root.to_path_buf(),
            });
        }
        fs::read_dir(&canonical_root).map_err(|source| SnapshotError::RootUnavailable {
            path: root.to_path_buf(),
            source,
        })?;

        let mut visited: HashSet<PathBuf> = HashSet::new();
        visited.insert(canonical_root);

        let mut excluded = 0usize;
        let mut revisits = 0usize;
        let mut loops = 0usize;
        let mut excluded_errors = 0usize;
        let mut stats = BuildStats::default();
        let mut tree = SnapshotNode::empty_dir();

        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                if entry.file_type().is_dir() {
                    if filter.is_excluded_dir(&name) {
                        excluded += 1;
                        return false;
                    }
                    let canonical = fs::canonicalize(entry.path())
                        .unwrap_or_else(|_| entry.path().to_path_buf());
                    if !visited.insert(canonical) {
                        revisits += 1;
                        return false;
                    }
                    true
                } else if filter.is_excluded_file(&name) {
                    excluded += 1;
                    false
                } else {
                    true
                }
            });

        for item in walker {
            let entry = match item {
                Ok(entry) => entry,
                Err(err) => {
                    if let Some(ancestor) = err.loop_ancestor() {
                        loops += 1;
                        crate::debug_event!("snapshot", "cycle", "{}", ancestor.display());
                        continue;
                    }
                    let Some(path) = err.path() else {
                        tracing::warn!("[snapshot] walk error: {err}");
                        continue;
                    };
                    if path == root {
                        return Err(SnapshotError::WalkFailed {
                            path: root.to_path_buf(),
                            reason: err.to_string(),
                        });
                    }
                    let Some(segments) = relative_segments(root, path) else {
                        continue;
                    };
                    if node_at(&tree, &segments).is_some() {
                        // Directory was recorded but its listing failed.
                        tracing::warn!("[snapshot] cannot list {}: {err}", path.display());
                        continue;
                    }
                    if segments.last().is_some_and(|n| filter.is_excluded(n)) {
                        excluded_errors += 1;
                        continue;
                    }
                    let repr = FileRepr::unreadable(segments.join("/"), &err);
                    if insert_node(&mut tree, &segments, SnapshotNode::File(Arc::new(repr))) {
                        stats.files += 1;
                        stats.unreadable += 1;
                    }
                    continue;
                }
            };

            if entry.depth() == 0 {
                continue;
            }
            let Some(segments) = relative_segments(root, entry.path()) else {
                continue;
            };

            let file_type = entry.file_type();
            let node = if file_type.is_dir() {
                stats.directories += 1;
                SnapshotNode::empty_dir()
            } else if file_type.is_file() {
                let rel = segments.join("/");
                let repr = match fs::read_to_string(entry.path()) {
                    Ok(content) => FileRepr::new(rel, content),
                    Err(e) => {
                        crate::debug_event!("snapshot", "unreadable", "{rel}: {e}");
                        stats.unreadable += 1;
                        FileRepr::unreadable(rel, e)
                    }
                };
                stats.files += 1;
                SnapshotNode::File(Arc::new(repr))
            } else {
                // Sockets, fifos and devices have no text content.
                crate::debug_event!("snapshot", "skipped special", "{}", entry.path().display());
                continue;
            };

            insert_node(&mut tree, &segments, node);
        }

        stats.excluded = excluded + excluded_errors;
        stats.cycles_skipped = revisits + loops;

        crate::debug_event!(
            "snapshot",
            "built",
            "{} files in {} directories ({} unreadable, {} excluded, {} cycles)",
            stats.files,
            stats.directories,
            stats.unreadable,
            stats.excluded,
            stats.cycles_skipped
        );

        Ok(Self {
            root: tree,
            filter,
            stats,
        })
    }

    /// Resolve a root-relative path.
    ///
    /// Segments are split on `/` or `\`. A leading `.` names the root. An
    /// excluded segment yields `Excluded`; a missing segment stops the walk
    /// with `NotFound`.
    pub fn lookup(&self, path: &str) -> Lookup<'_> {
        let mut current = &self.root;

        for segment in path
            .split(['/', '\\'])
            .filter(|s| !s.is_empty() && *s != ROOT_SENTINEL)
        {
            if self.filter.is_excluded(segment) {
                return Lookup::Excluded;
            }
            let next = match current {
                SnapshotNode::Directory(children) => children.get(segment),
                SnapshotNode::File(_) => None,
            };
            match next {
                Some(node) => current = node,
                None => return Lookup::NotFound,
            }
        }

        Lookup::Found(current)
    }

    /// Shorthand for a lookup that must land on a file.
    pub fn file(&self, path: &str) -> Option<Arc<FileRepr>> {
        self.lookup(path).file().cloned()
    }

    pub fn root(&self) -> &SnapshotNode {
        &self.root
    }

    pub fn filter(&self) -> &Arc<PathFilter> {
        &self.filter
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    pub fn file_count(&self) -> usize {
        self.stats.files
    }

    pub fn is_empty(&self) -> bool {
        self.root.children().is_none_or(|c| c.is_empty())
    }

    /// All file reprs in path order.
    pub fn files(&self) -> Vec<Arc<FileRepr>> {
        let mut out = Vec::with_capacity(self.stats.files);
        self.root.collect_files(&mut out);
        out
    }

    /// Pretty JSON of the tree under the root sentinel. Files show as paths.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        let mut wrapper = serde_json::Map::new();
        wrapper.insert(ROOT_SENTINEL.to_string(), serde_json::to_value(&self.root)?);
        serde_json::to_string_pretty(&wrapper)
    }
}

/// Path components of `path` below `root`, as strings.
fn relative_segments(root: &Path, path: &Path) -> Option<Vec<String>> {
    let relative = path.strip_prefix(root).ok()?;
    let segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    (!segments.is_empty()).then_some(segments)
}

fn node_at<'a>(root: &'a SnapshotNode, segments: &[String]) -> Option<&'a SnapshotNode> {
    let mut current = root;
    for segment in segments {
        current = current.children()?.get(segment)?;
    }
    Some(current)
}

/// Place `node` at `segments`. Parents must already exist, which holds for
/// a pre-order walk.
fn insert_node(root: &mut SnapshotNode, segments: &[String], node: SnapshotNode) -> bool {
    let Some((name, parents)) = segments.split_last() else {
        return false;
    };

    let mut current = root;
    for segment in parents {
        current = match current {
            SnapshotNode::Directory(children) => match children.get_mut(segment) {
                Some(child) => child,
                None => return false,
            },
            SnapshotNode::File(_) => return false,
        };
    }

    match current {
        SnapshotNode::Directory(children) => {
            children.insert(name.clone(), node);
            true
        }
        SnapshotNode::File(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn default_filter() -> Arc<PathFilter> {
        Arc::new(PathFilter::new(
            ["node_modules", ".git", "__pycache__", "venv"],
            ["db.sqlite3", ".gitignore", "package-lock.json", ".env"],
        ))
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_build_captures_nested_files() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.txt", "hello");
        write(temp.path(), "src/lib.rs", "pub fn f() {}\n");
        write(temp.path(), "src/deep/mod.rs", "// mod\n");

        let tree = SnapshotTree::build(temp.path(), default_filter()).unwrap();

        assert_eq!(tree.file_count(), 3);
        assert_eq!(tree.stats().directories, 2);

        let repr = tree.file("src/deep/mod.rs").unwrap();
        assert_eq!(repr.path, "src/deep/mod.rs");
        assert_eq!(repr.content, "// mod\n");
        assert!(!repr.unreadable);
    }

    #[test]
    fn test_excluded_names_absent_at_every_depth() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "keep.txt", "k");
        write(temp.path(), ".env", "SECRET=1");
        write(temp.path(), "node_modules/pkg/index.js", "x");
        write(temp.path(), "app/node_modules/pkg/index.js", "x");
        write(temp.path(), "app/nested/.env", "SECRET=2");
        write(temp.path(), "app/nested/.git/HEAD", "ref");

        let tree = SnapshotTree::build(temp.path(), default_filter()).unwrap();

        fn assert_no_excluded(node: &SnapshotNode) {
            if let Some(children) = node.children() {
                for (name, child) in children {
                    assert!(
                        !["node_modules", ".git", ".env"].contains(&name.as_str()),
                        "excluded name {name} present"
                    );
                    assert_no_excluded(child);
                }
            }
        }
        assert_no_excluded(tree.root());
        assert!(tree.file("keep.txt").is_some());
        assert_eq!(tree.stats().excluded, 5);
    }

    #[test]
    fn test_invalid_utf8_becomes_diagnostic() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("blob.bin"), [0xff, 0xfe, 0x00, 0x80]).unwrap();
        write(temp.path(), "ok.txt", "fine");

        let tree = SnapshotTree::build(temp.path(), default_filter()).unwrap();

        let blob = tree.file("blob.bin").unwrap();
        assert!(blob.unreadable);
        assert!(blob.content.starts_with("Error reading file"));
        assert_eq!(tree.stats().unreadable, 1);
        assert_eq!(tree.file("ok.txt").unwrap().content, "fine");
    }

    #[test]
    fn test_missing_root_is_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("gone");

        let err = SnapshotTree::build(&missing, default_filter()).unwrap_err();
        assert!(matches!(err, SnapshotError::RootUnavailable { .. }));
    }

    #[test]
    fn test_file_root_is_error() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "plain.txt", "x");

        let err = SnapshotTree::build(&temp.path().join("plain.txt"), default_filter()).unwrap_err();
        assert!(matches!(err, SnapshotError::RootNotDirectory { .. }));
    }

    #[test]
    fn test_lookup_outcomes() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "src/main.rs", "fn main() {}");
        write(temp.path(), "src/node_modules/x.js", "x");

        let tree = SnapshotTree::build(temp.path(), default_filter()).unwrap();

        assert!(tree.lookup("src/main.rs").file().is_some());
        assert!(tree.lookup("./src/main.rs").file().is_some());
        assert!(tree.lookup(".\\src\\main.rs").file().is_some());
        assert!(matches!(tree.lookup("src"), Lookup::Found(n) if n.is_dir()));
        assert!(matches!(tree.lookup("."), Lookup::Found(n) if n.is_dir()));

        assert_eq!(tree.lookup("src/node_modules/x.js"), Lookup::Excluded);
        assert_eq!(tree.lookup("src/.env"), Lookup::Excluded);
        assert_eq!(tree.lookup("src/other.rs"), Lookup::NotFound);
        assert_eq!(tree.lookup("src/main.rs/extra"), Lookup::NotFound);
    }

    #[test]
    fn test_missing_segment_does_not_fall_through() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a/target.txt", "a");
        write(temp.path(), "target.txt", "root");

        let tree = SnapshotTree::build(temp.path(), default_filter()).unwrap();

        // "b" is absent; resolving must not continue from the root and
        // return the root-level target.txt.
        assert_eq!(tree.lookup("b/target.txt"), Lookup::NotFound);
    }

    #[test]
    fn test_empty_tree_lookup() {
        let tree = SnapshotTree::empty(default_filter());
        assert!(tree.is_empty());
        assert_eq!(tree.lookup("a.txt"), Lookup::NotFound);
        assert_eq!(tree.lookup("venv/a.py"), Lookup::Excluded);
    }

    #[test]
    fn test_json_dump_hides_content() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "src/a.txt", "top secret body");

        let tree = SnapshotTree::build(temp.path(), default_filter()).unwrap();
        let json = tree.to_json_pretty().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["."]["src"]["a.txt"], "src/a.txt");
        assert!(!json.contains("top secret body"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_terminates() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().unwrap();
        write(temp.path(), "a/b/file.txt", "inside");
        symlink(temp.path().join("a"), temp.path().join("a/b/loop")).unwrap();
        symlink(temp.path(), temp.path().join("a/root_link")).unwrap();

        let tree = SnapshotTree::build(temp.path(), default_filter()).unwrap();

        assert_eq!(tree.stats().directories, 2);
        assert_eq!(tree.file_count(), 1);
        assert!(tree.stats().cycles_skipped >= 2);
        assert!(tree.file("a/b/file.txt").is_some());
        assert_eq!(tree.lookup("a/b/loop/b/file.txt"), Lookup::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_link_becomes_diagnostic() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().unwrap();
        write(temp.path(), "ok.txt", "fine");
        symlink(temp.path().join("missing.txt"), temp.path().join("broken.txt")).unwrap();

        let tree = SnapshotTree::build(temp.path(), default_filter()).unwrap();

        let broken = tree.file("broken.txt").unwrap();
        assert!(broken.unreadable);
        assert!(broken.content.starts_with("Error reading file: "));
        assert_eq!(tree.stats().files, 2);
        assert_eq!(tree.stats().unreadable, 1);
        assert_eq!(tree.file("ok.txt").unwrap().content, "fine");
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_link_with_excluded_name_is_counted() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("conf")).unwrap();
        symlink(temp.path().join("nowhere"), temp.path().join("conf/.env")).unwrap();

        let tree = SnapshotTree::build(temp.path(), default_filter()).unwrap();

        assert_eq!(tree.file_count(), 0);
        assert_eq!(tree.lookup("conf/.env"), Lookup::Excluded);
        assert_eq!(tree.stats().excluded, 1);
        assert!(!tree.to_json_pretty().unwrap().contains(".env"));
    }
}

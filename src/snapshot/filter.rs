//! Exclusion policy for tracked names.

use std::collections::HashSet;

use crate::config::WatchConfig;

/// Decides whether a directory or file name is excluded from tracking.
///
/// Matching is exact membership on the base name. A name matches wherever
/// it appears in the tree; there is no glob or prefix matching.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    excluded_dirs: HashSet<String>,
    excluded_files: HashSet<String>,
}

impl PathFilter {
    /// Create a filter from explicit name sets.
    pub fn new<D, F>(dirs: D, files: F) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            excluded_dirs: dirs.into_iter().map(Into::into).collect(),
            excluded_files: files.into_iter().map(Into::into).collect(),
        }
    }

    /// Build the filter from watch settings.
    pub fn from_config(config: &WatchConfig) -> Self {
        Self::new(
            config.excluded_dirs.iter().cloned(),
            config.excluded_files.iter().cloned(),
        )
    }

    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.excluded_dirs.contains(name)
    }

    pub fn is_excluded_file(&self, name: &str) -> bool {
        self.excluded_files.contains(name)
    }

    /// True if the name is in either set.
    ///
    /// Lookups use this because a path segment does not say whether it
    /// names a directory or a file.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.is_excluded_dir(name) || self.is_excluded_file(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_filter() {
        let filter = PathFilter::from_config(&WatchConfig::default());

        assert!(filter.is_excluded_dir("node_modules"));
        assert!(filter.is_excluded_dir(".git"));
        assert!(filter.is_excluded_file(".env"));
        assert!(filter.is_excluded_file("package-lock.json"));

        assert!(!filter.is_excluded_dir("src"));
        assert!(!filter.is_excluded_file("main.rs"));
    }

    #[test]
    fn test_sets_are_independent() {
        let filter = PathFilter::new(["build"], ["secrets.txt"]);

        assert!(filter.is_excluded_dir("build"));
        assert!(!filter.is_excluded_file("build"));
        assert!(filter.is_excluded_file("secrets.txt"));
        assert!(!filter.is_excluded_dir("secrets.txt"));

        assert!(filter.is_excluded("build"));
        assert!(filter.is_excluded("secrets.txt"));
    }

    #[test]
    fn test_exact_match_only() {
        let filter = PathFilter::new(["venv"], [".env"]);

        assert!(!filter.is_excluded_dir("venv2"));
        assert!(!filter.is_excluded_dir("my_venv"));
        assert!(!filter.is_excluded_file(".env.example"));
        assert!(!filter.is_excluded_file("VENV"));
    }
}

//! Snapshot and Diff commands.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Settings;
use crate::diff::{DiffEngine, line_counts};
use crate::snapshot::{PathFilter, SnapshotTree};

/// Print the tracked tree of `dir` as JSON.
pub fn run_snapshot(dir: &Path, settings: &Settings) -> Result<()> {
    let filter = Arc::new(PathFilter::from_config(&settings.watch));
    let tree = SnapshotTree::build(dir, filter)?;

    println!("{}", tree.to_json_pretty()?);

    let stats = tree.stats();
    eprintln!(
        "{} files in {} directories ({} unreadable, {} excluded)",
        stats.files, stats.directories, stats.unreadable, stats.excluded
    );
    Ok(())
}

/// Print changed lines between two files.
pub fn run_diff(old: &Path, new: &Path, settings: &Settings) -> Result<()> {
    let old_text =
        fs::read_to_string(old).with_context(|| format!("Cannot read {}", old.display()))?;
    let new_text =
        fs::read_to_string(new).with_context(|| format!("Cannot read {}", new.display()))?;

    let batch = DiffEngine::new(settings.watch.diff_algorithm).diff(&old_text, &new_text);
    for line in &batch {
        println!("{line}");
    }

    let (added, removed) = line_counts(&batch);
    eprintln!("{added} added, {removed} removed");
    Ok(())
}

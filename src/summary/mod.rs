//! Turning collected diffs into a commit message.
//!
//! The pipeline never depends on this module: diffs keep accumulating in
//! the cache whether or not a summarizer is configured or reachable.

mod chat;
mod error;

pub use chat::ChatSummarizer;
pub use error::{SummaryError, SummaryResult};

use std::fmt::Write;

use async_trait::async_trait;

use crate::cache::CommitEntries;

/// Line placed above every generated message.
pub const COMMIT_HEADER: &str = "Generated commit message:";

/// Produces a natural-language message from recorded diffs.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Name for logging.
    fn name(&self) -> &str;

    async fn summarize(&self, entries: &CommitEntries) -> SummaryResult<String>;
}

/// Plain-text rendering of cache contents, one section per path.
///
/// ```text
/// src/main.rs
///   change 1
///     - old line
///     + new line
/// ```
pub fn render_entries(entries: &CommitEntries) -> String {
    let mut out = String::new();

    for (path, batches) in entries {
        let _ = writeln!(out, "{path}");
        for (index, batch) in batches.iter().enumerate() {
            let _ = writeln!(out, "  change {}", index + 1);
            if batch.is_empty() {
                let _ = writeln!(out, "    (no line changes)");
            }
            for line in batch {
                let _ = writeln!(out, "    {line}");
            }
        }
    }

    out
}

/// Prefix a model reply with [`COMMIT_HEADER`].
pub fn with_header(message: &str) -> String {
    format!("{COMMIT_HEADER}\n{}", message.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffLine;

    #[test]
    fn test_render_entries() {
        let mut entries = CommitEntries::new();
        entries.insert(
            "a.txt".to_string(),
            vec![
                vec![DiffLine::Removed("hello".into()), DiffLine::Added("hello world".into())],
                vec![],
            ],
        );

        let rendered = render_entries(&entries);
        assert_eq!(
            rendered,
            "a.txt\n  change 1\n    - hello\n    + hello world\n  change 2\n    (no line changes)\n"
        );
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_entries(&CommitEntries::new()), "");
    }

    #[test]
    fn test_with_header() {
        assert_eq!(
            with_header("  Add greeting\n"),
            "Generated commit message:\nAdd greeting"
        );
    }
}

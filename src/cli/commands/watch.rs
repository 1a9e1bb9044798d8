//! Watch command - observe a directory and take interactive commands.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cache::CommitEntries;
use crate::config::Settings;
use crate::diff::line_counts;
use crate::summary::{ChatSummarizer, Summarizer, render_entries};
use crate::watcher::{ChangeProcessor, FsEventSource};

const HELP: &str = "\
Commands:
  commit        Generate a commit message from collected diffs
  status        List paths with recorded changes
  diff [PATH]   Show recorded diffs (all paths when PATH is omitted)
  tree          Print the current snapshot
  help          Show this list
  exit          Stop watching";

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopCommand {
    Commit,
    Status,
    Diff(Option<String>),
    Tree,
    Help,
    Exit,
    Empty,
    Unknown(String),
}

impl LoopCommand {
    pub fn parse(line: &str) -> Self {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return LoopCommand::Empty;
        };

        match command.to_lowercase().as_str() {
            "commit" => LoopCommand::Commit,
            "status" => LoopCommand::Status,
            "diff" => LoopCommand::Diff(words.next().map(str::to_string)),
            "tree" => LoopCommand::Tree,
            "help" | "?" => LoopCommand::Help,
            "exit" | "quit" | "q" => LoopCommand::Exit,
            _ => LoopCommand::Unknown(command.to_string()),
        }
    }
}

/// One line per path: batch count and line totals.
pub fn format_status(entries: &CommitEntries) -> String {
    if entries.is_empty() {
        return "No changes recorded yet.".to_string();
    }

    entries
        .iter()
        .map(|(path, batches)| {
            let (added, removed) = batches
                .iter()
                .map(|batch| line_counts(batch))
                .fold((0, 0), |(a, r), (da, dr)| (a + da, r + dr));
            format!(
                "{path}: {} change(s), +{added} -{removed}",
                batches.len()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Recorded diffs for one path, or for all paths.
pub fn format_diffs(entries: &CommitEntries, path: Option<&str>) -> String {
    match path {
        None => render_entries(entries),
        Some(path) => match entries.get_key_value(path) {
            Some((key, batches)) => {
                let mut single = CommitEntries::new();
                single.insert(key.clone(), batches.clone());
                render_entries(&single)
            }
            None => format!("No changes recorded for {path}"),
        },
    }
}

/// Run the watch command until `exit`, end of input, or Ctrl-C.
pub async fn run_watch(dir: PathBuf, debounce_ms: Option<u64>, settings: &Settings) -> Result<()> {
    if !dir.is_dir() {
        bail!("{} is not a valid directory", dir.display());
    }

    let mut watch_config = settings.watch.clone();
    if let Some(ms) = debounce_ms {
        watch_config.debounce_ms = ms;
    }

    let processor = Arc::new(ChangeProcessor::new(&dir, &watch_config));
    let stats = processor
        .construct()
        .with_context(|| format!("Initial snapshot of {} failed", dir.display()))?;
    println!(
        "Watching {} ({} files in {} directories). Type 'help' for commands.",
        dir.display(),
        stats.files,
        stats.directories
    );

    let (source, events) = FsEventSource::start(&dir, watch_config.channel_capacity)?;
    let worker = {
        let processor = Arc::clone(&processor);
        std::thread::Builder::new()
            .name("vcwatch-processor".to_string())
            .spawn(move || processor.run(events))
            .context("Failed to start processor thread")?
    };

    let summarizer = match ChatSummarizer::from_config(&settings.summary) {
        Ok(summarizer) => Some(summarizer),
        Err(e) => {
            tracing::warn!("[summary] commit messages disabled: {e}");
            None
        }
    };

    command_loop(&processor, summarizer.as_ref(), &dir).await?;

    // Dropping the source closes the channel, which ends the worker.
    drop(source);
    worker
        .join()
        .map_err(|_| anyhow!("Processor thread panicked"))?;

    Ok(())
}

async fn command_loop(
    processor: &ChangeProcessor,
    summarizer: Option<&ChatSummarizer>,
    dir: &Path,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt();

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        match LoopCommand::parse(&line) {
            LoopCommand::Commit => {
                let Some(summarizer) = summarizer else {
                    println!("Commit messages are disabled: no API key configured.");
                    continue;
                };
                let entries = processor.cache().all_entries();
                crate::debug_event!("summary", summarizer.name(), "{} paths", entries.len());
                match summarizer.summarize(&entries).await {
                    Ok(message) => println!("{message}"),
                    Err(e) => println!("Error generating commit message: {e}"),
                }
            }
            LoopCommand::Status => {
                println!("Tracking {} files", processor.tracked_files());
                println!("{}", format_status(&processor.cache().all_entries()));
            }
            LoopCommand::Diff(path) => {
                let entries = processor.cache().all_entries();
                print!("{}", format_diffs(&entries, path.as_deref()));
                println!();
            }
            LoopCommand::Tree => match processor.tree_json() {
                Ok(json) => println!("{json}"),
                Err(e) => println!("Error rendering tree: {e}"),
            },
            LoopCommand::Help => println!("{HELP}"),
            LoopCommand::Exit => break,
            LoopCommand::Empty => {}
            LoopCommand::Unknown(word) => {
                println!("Unknown command '{word}'. Type 'help' for commands.");
            }
        }
    }

    println!("Stopped watching {}", dir.display());
    Ok(())
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

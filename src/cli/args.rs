//! CLI argument parsing using clap.
//!
//! Contains the Cli struct and the Commands enum.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Directory watcher that collects line diffs for commit messages
#[derive(Parser)]
#[command(
    name = "vcwatch",
    version = env!("CARGO_PKG_VERSION"),
    about = "Watch a directory and collect line diffs for commit messages",
    long_about = "Snapshot a directory, diff every modified file against its previous \
                  content, and turn the collected diffs into a commit message on request.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Initialize project
    #[command(about = "Set up .vcwatch directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Watch a directory and record diffs as files change
    #[command(
        about = "Watch a directory and collect diffs interactively",
        after_help = "Commands while watching:\n  commit        Generate a commit message from collected diffs\n  status        List paths with recorded changes\n  diff [PATH]   Show recorded diffs\n  tree          Print the current snapshot\n  help          Show this list\n  exit          Stop watching"
    )]
    Watch {
        /// Directory to watch (defaults to the current directory)
        #[arg(value_name = "DIR", default_value = ".")]
        dir: PathBuf,

        /// Debounce interval in milliseconds (overrides config)
        #[arg(long)]
        debounce_ms: Option<u64>,
    },

    /// Print the snapshot tree of a directory
    #[command(about = "Print the tracked tree of a directory as JSON")]
    Snapshot {
        /// Directory to snapshot
        #[arg(value_name = "DIR", default_value = ".")]
        dir: PathBuf,
    },

    /// Diff two files line by line
    #[command(about = "Show changed lines between two files")]
    Diff {
        /// Previous version
        old: PathBuf,
        /// Current version
        new: PathBuf,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings from .vcwatch/settings.toml")]
    Config,
}

use clap::Parser;

use vcwatch::Settings;
use vcwatch::cli::commands::{init, snapshot, watch};
use vcwatch::cli::{Cli, Commands};
use vcwatch::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Init only writes the default file, it never needs existing settings.
    if let Commands::Init { force } = cli.command {
        init::run_init(force);
        return;
    }

    let loaded = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let settings = loaded.unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        eprintln!("Using default configuration.");
        Settings::default()
    });

    logging::init_with_config(&settings.logging);

    let result = match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Config => {
            init::run_config(&settings);
            Ok(())
        }
        Commands::Watch { dir, debounce_ms } => watch::run_watch(dir, debounce_ms, &settings).await,
        Commands::Snapshot { dir } => snapshot::run_snapshot(&dir, &settings),
        Commands::Diff { old, new } => snapshot::run_diff(&old, &new, &settings),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

use std::fs::File;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use skyscape::config::Cli;
use skyscape::{snapshot, terminal};

/// Sets up logging. The interactive app owns the terminal, so without
/// `--log-file` it logs nowhere; snapshots fall back to stderr.
fn init_tracing(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match (&cli.log_file, cli.snapshot.is_some()) {
        (Some(path), _) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        (None, true) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        (None, false) => {}
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.validate()?;
    init_tracing(&cli)?;

    match &cli.snapshot {
        Some(path) => snapshot::run_snapshot(&cli, path),
        None => terminal::run(&cli),
    }
}

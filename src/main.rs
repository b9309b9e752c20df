//! Augmenta Settings - edit the `augmenta.yaml` research configuration
//!
//! Every command runs against a single settings store for the duration of
//! the invocation: the file is loaded once, edited through the store, and
//! persisted before the command reports success.

mod cli;

use anyhow::Result;
use augmenta_settings::config::{ConfigStore, LoadOrigin, LoadOutcome, paths};
use clap::Parser;
use std::path::PathBuf;

/// Augmenta Settings - edit the Augmenta research configuration
#[derive(Parser, Debug)]
#[command(name = "augmenta-settings")]
#[command(about = "Edit the Augmenta research configuration file", long_about = None)]
struct Args {
    /// Settings file (defaults to $AUGMENTA_CONFIG, then ./augmenta.yaml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'd', global = true)]
    debug: bool,

    #[command(subcommand)]
    command: cli::Command,
}

fn main() -> Result<()> {
    let args = Args::parse();
    cli::init_logging(args.debug);

    let path = paths::resolve_config_path(args.config.as_deref());
    tracing::debug!("Using settings file {}", path.display());

    let mut store = ConfigStore::new(path);
    let outcome = if args.command.needs_document() {
        store.load()
    } else {
        LoadOutcome {
            document: store.document().clone(),
            origin: LoadOrigin::Default,
            warning: None,
        }
    };

    cli::handle_command(&mut store, &outcome, args.command)
}

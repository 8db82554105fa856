//! `agile-viewer` — inspect legacy AgileKeychain vaults from the terminal.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

mod commands;
mod password;

use std::path::PathBuf;

use agile_vault::EngineConfig;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agile-viewer", about = "Read-only AgileKeychain vault viewer", version)]
struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Engine configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Check whether a path is a readable keychain directory
    Validate {
        /// Path to a `.agilekeychain` directory
        path: PathBuf,
    },

    /// List entries from the index (no password needed)
    List {
        /// Path to a `.agilekeychain` directory
        path: PathBuf,
        /// Case-insensitive filter on title, location and type
        #[arg(long, short)]
        query: Option<String>,
    },

    /// Decrypt and show one entry
    ///
    /// The master password is read from `AGILE_VIEWER_PASSWORD`, or the
    /// first line of stdin.
    Show {
        /// Path to a `.agilekeychain` directory
        path: PathBuf,
        /// Entry identifier
        uuid: String,
    },

    /// Compare index rows against entry files on disk
    Reconcile {
        /// Path to a `.agilekeychain` directory
        path: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("agile_vault={level},agile_viewer={level},warn"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = agile_crypto_core::disable_core_dumps() {
        tracing::warn!(error = %e, "core dumps could not be disabled");
    }

    let config = cli
        .config
        .as_deref()
        .map_or_else(EngineConfig::default, EngineConfig::load);

    match cli.command {
        Command::Validate { path } => commands::validate::run(&path, cli.format)?,
        Command::List { path, query } => {
            commands::list::run(&path, query.as_deref(), config, cli.format)?;
        }
        Command::Show { path, uuid } => {
            let password = password::read_password()?;
            commands::show::run(&path, &uuid, &password, config, cli.format)?;
        }
        Command::Reconcile { path } => commands::reconcile::run(&path, config, cli.format)?,
    }

    Ok(())
}

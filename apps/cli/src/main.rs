//! RelayGate CLI
//!
//! Runs the relay daemon and inspects its persistent store.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;

use relaygate_daemon::DaemonService;
use relaygate_logging::init_logging;
use relaygate_settings::{default_settings_path, Settings};
use relaygate_store::TtlStore;

/// RelayGate - verified message relay between guests and one operator
#[derive(Parser)]
#[command(name = "relaygate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (JSON); environment variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook listener
    Serve,

    /// Inspect or maintain the store file
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Print every live entry as JSON
    Dump,
    /// Remove expired entries
    Purge,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let path = cli.config.unwrap_or_else(default_settings_path);
    let mut settings = Settings::load_from(&path)
        .with_context(|| format!("Failed to load settings from {:?}", path))?;
    settings.apply_env();

    match cli.command {
        Commands::Serve => serve(settings).await?,
        Commands::Store { action } => {
            let store = TtlStore::open(&settings.store.path);
            match action {
                StoreAction::Dump => dump(&store)?,
                StoreAction::Purge => purge(&store)?,
            }
        }
    }

    Ok(())
}

async fn serve(settings: Settings) -> Result<()> {
    info!("Starting RelayGate {}", env!("CARGO_PKG_VERSION"));
    let service = DaemonService::new(settings).context("Failed to start daemon")?;
    service.run().await.context("Webhook listener failed")?;
    Ok(())
}

fn dump(store: &TtlStore) -> Result<()> {
    let entries: Vec<_> = store
        .snapshot()
        .into_iter()
        .map(|(key, entry)| json!({ "key": key, "value": entry.value, "expiresAt": entry.expires_at }))
        .collect();
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn purge(store: &TtlStore) -> Result<()> {
    let purged = store.purge_expired().context("Failed to rewrite store")?;
    println!("Purged {} expired entries", purged);
    Ok(())
}

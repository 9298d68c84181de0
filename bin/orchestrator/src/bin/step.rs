//! CLI tool to run individual relayer passes for testing.
//!
//! Each pass of the main loop can be run independently:
//! - `prove-pass`: prove eligible OP-Stack withdrawals
//! - `claim-pass`: claim transfers whose waiting period has elapsed

use clap::{Parser, Subcommand};
use orchestrator::{
    config::Config, metrics::Metrics, run_claim_pass, run_prove_pass, OnchainRelayer, Relayer,
};
use std::sync::Arc;
use store::{MemoryStatusStore, StatusStore};
use tracing::info;

#[derive(Parser)]
#[command(name = "step")]
#[command(about = "Run individual relayer passes for testing")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Private key for signing transactions (hex string, with or without 0x prefix)
    #[arg(short = 'k', long, env = "PRIVATE_KEY")]
    private_key: String,

    /// Dry-run mode: build and validate payloads without submitting
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Prove eligible OP-Stack withdrawals
    ProvePass,

    /// Claim transfers whose waiting period has elapsed
    ClaimPass,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_file(&cli.config)?;
    if cli.dry_run {
        config.dry_run = true;
    }

    info!("Loaded config:");
    info!("  Network set: {:?}", config.network);
    info!("  Transfers file: {}", config.transfers_file.display());
    if config.dry_run {
        info!("  Mode: DRY-RUN (no transactions will be executed)");
    }

    let metrics = Metrics::new();
    let registry = config.registry()?;
    let policy = config.policy();

    let store = Arc::new(MemoryStatusStore::from_json_file(&config.transfers_file)?);
    let store_dyn: Arc<dyn StatusStore> = store.clone();
    let relayer: Arc<dyn Relayer> = Arc::new(OnchainRelayer::new(
        registry.clone(),
        cli.private_key,
        config.dry_run,
    )?);

    let report = match cli.command {
        Command::ProvePass => {
            info!("Running: prove-pass");
            run_prove_pass(store_dyn, relayer, &registry, &policy, &metrics).await?
        }
        Command::ClaimPass => {
            info!("Running: claim-pass");
            run_claim_pass(store_dyn, relayer, &registry, &policy, &metrics).await?
        }
    };

    store.write_json_file(&config.transfers_file)?;

    info!(
        proved = report.proved,
        claimed = report.claimed,
        skipped = report.skipped,
        failed = report.failed,
        "Pass complete"
    );

    Ok(())
}

//! Long-running relayer: alternates prove and claim passes on an interval.

use clap::Parser;
use orchestrator::{
    config::Config,
    metrics::{install_prometheus_exporter, Metrics},
    run_claim_pass, run_prove_pass, OnchainRelayer, Relayer,
};
use std::sync::Arc;
use std::time::Duration;
use store::{BridgeStatus, MemoryStatusStore, StatusStore};
use tokio::time;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "orchestrator")]
#[command(about = "Relay pending bridge transfers: prove and claim on an interval")]
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

    info!("Starting orchestrator");
    info!("  Network set: {:?}", config.network);
    info!("  Transfers file: {}", config.transfers_file.display());
    info!("  Pass interval: {}s", config.interval_secs);
    if config.dry_run {
        info!("  Mode: DRY-RUN (no transactions will be executed)");
    }

    let metrics = Metrics::new();
    if let Some(port) = config.metrics_port {
        install_prometheus_exporter(port)?;
        info!("  Metrics: http://0.0.0.0:{port}/metrics");
    }

    let registry = config.registry()?;
    let policy = config.policy();

    let store = Arc::new(MemoryStatusStore::from_json_file(&config.transfers_file)?);
    let relayer: Arc<dyn Relayer> = Arc::new(OnchainRelayer::new(
        registry.clone(),
        cli.private_key,
        config.dry_run,
    )?);

    let mut interval = time::interval(Duration::from_secs(config.interval_secs));

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }

        let store_dyn: Arc<dyn StatusStore> = store.clone();
        if let Err(e) = run_prove_pass(
            store_dyn.clone(),
            relayer.clone(),
            &registry,
            &policy,
            &metrics,
        )
        .await
        {
            error!(error = %e, "Prove pass aborted");
            continue;
        }

        if let Err(e) =
            run_claim_pass(store_dyn, relayer.clone(), &registry, &policy, &metrics).await
        {
            error!(error = %e, "Claim pass aborted");
            continue;
        }

        // Persist progress so a restart resumes where this pass left off.
        if let Err(e) = store.write_json_file(&config.transfers_file) {
            error!(error = %e, "Failed to persist transfer statuses");
        }

        for status in [
            BridgeStatus::Initiated,
            BridgeStatus::Proven,
            BridgeStatus::Finalized,
        ] {
            let count = store.by_status(status, None, None).await?.len();
            metrics.set_pending_transfers(&format!("{status:?}").to_uppercase(), count);
        }
    }

    Ok(())
}

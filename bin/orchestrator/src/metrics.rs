//! Prometheus metrics for the orchestrator.
//!
//! All metrics are aggregated in the [`Metrics`] struct for easy tracking and management.

use crate::PassReport;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;

/// Aggregated metrics for the orchestrator.
///
/// Metrics are registered with the global metrics registry on creation.
#[derive(Debug, Clone)]
pub struct Metrics {
    _private: (),
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics instance and register all metric descriptions.
    pub fn new() -> Self {
        Self::register_descriptions();
        Self { _private: () }
    }

    /// Register metric descriptions with the global registry.
    fn register_descriptions() {
        // Pass metrics
        describe_counter!(
            "relayer_passes_total",
            "Total number of passes executed, by pass kind"
        );
        describe_histogram!(
            "relayer_pass_duration_seconds",
            "Duration of each pass in seconds, by pass kind"
        );

        // Transfer outcome metrics
        describe_counter!(
            "relayer_transfers_proved_total",
            "Total number of withdrawals proven on their destination chain"
        );
        describe_counter!(
            "relayer_transfers_claimed_total",
            "Total number of transfers claimed against a destination pool"
        );
        describe_counter!(
            "relayer_transfers_skipped_total",
            "Total number of transfers skipped as not yet ready"
        );
        describe_counter!(
            "relayer_transfers_failed_total",
            "Total number of transfers that failed permanently"
        );

        // Pending transfer counts
        describe_gauge!(
            "relayer_pending_transfers",
            "Number of pending transfers by status"
        );
    }

    /// Record a completed pass.
    pub fn record_pass(&self, kind: &str, duration: Duration) {
        counter!("relayer_passes_total", "kind" => kind.to_string()).increment(1);
        histogram!("relayer_pass_duration_seconds", "kind" => kind.to_string())
            .record(duration.as_secs_f64());
    }

    /// Record the outcome counts of a pass.
    pub fn record_report(&self, report: &PassReport) {
        counter!("relayer_transfers_proved_total").increment(report.proved as u64);
        counter!("relayer_transfers_claimed_total").increment(report.claimed as u64);
        counter!("relayer_transfers_skipped_total").increment(report.skipped as u64);
        counter!("relayer_transfers_failed_total").increment(report.failed as u64);
    }

    /// Set the count of pending transfers for one status.
    pub fn set_pending_transfers(&self, status: &str, count: usize) {
        gauge!("relayer_pending_transfers", "status" => status.to_string()).set(count as f64);
    }
}

/// Install the Prometheus metrics exporter and start the HTTP server.
///
/// Returns an error if the server fails to bind to the specified port.
pub fn install_prometheus_exporter(port: u16) -> eyre::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::net::SocketAddr;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| eyre::eyre!("Failed to install Prometheus exporter: {}", e))?;

    Ok(())
}

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(handle)
}

/// Pre-register so every series appears before its first update.
pub fn register_metrics() {
    counter!("trades_ingested_total").absolute(0);
    counter!("trades_duplicate_total").absolute(0);
    counter!("trades_rejected_total").absolute(0);
    counter!("trades_scored_total").absolute(0);
    counter!("alerts_created_total").absolute(0);
    counter!("alerts_settled_total").absolute(0);

    gauge!("fresh_wallets").set(0.0);
    gauge!("pending_alerts").set(0.0);

    // Histograms are created lazily on first record.
    histogram!("detection_pass_seconds").record(0.0);
}

use metrics::gauge;
use sqlx::PgPool;

use crate::config::DetectionConfig;
use crate::db::alert_repo;
use crate::intelligence::alert_engine::{self, BatchReport};
use crate::models::AlertStatus;

/// One detection pass over up to `batch_size` unscored trades.
pub async fn run_detection_pass(
    pool: &PgPool,
    config: &DetectionConfig,
    batch_size: i64,
) -> anyhow::Result<BatchReport> {
    let report = alert_engine::analyze_unscored_trades(pool, config, batch_size).await?;

    let pending = alert_repo::count_alerts(pool, Some(AlertStatus::Pending)).await?;
    gauge!("pending_alerts").set(pending as f64);

    if report.failed > 0 {
        tracing::warn!(failed = report.failed, "Some trades could not be analyzed");
    }

    Ok(report)
}

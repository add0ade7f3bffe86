use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::db::{alert_repo, trade_repo, wallet_repo};
use crate::errors::AppError;
use crate::models::AlertStatus;
use crate::AppState;

use super::ApiResponse;

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total_wallets: i64,
    pub fresh_wallets: i64,
    pub total_trades: i64,
    pub total_alerts: i64,
    pub pending_alerts: i64,
    pub won_alerts: i64,
    pub lost_alerts: i64,
    pub dismissed_alerts: i64,
    /// Won / (won + lost); `None` until an alert settles.
    pub hit_rate: Option<f64>,
}

/// GET /api/analytics/summary
pub async fn summary(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Summary>>, AppError> {
    let db = &state.db;

    let won = alert_repo::count_alerts(db, Some(AlertStatus::Won)).await?;
    let lost = alert_repo::count_alerts(db, Some(AlertStatus::Lost)).await?;
    let settled = won + lost;

    let summary = Summary {
        total_wallets: wallet_repo::count_wallets(db).await?,
        fresh_wallets: wallet_repo::count_fresh_wallets(db).await?,
        total_trades: trade_repo::count_trades(db).await?,
        total_alerts: alert_repo::count_alerts(db, None).await?,
        pending_alerts: alert_repo::count_alerts(db, Some(AlertStatus::Pending)).await?,
        won_alerts: won,
        lost_alerts: lost,
        dismissed_alerts: alert_repo::count_alerts(db, Some(AlertStatus::Dismissed)).await?,
        hit_rate: (settled > 0).then(|| won as f64 / settled as f64),
    };

    Ok(Json(ApiResponse::ok(summary)))
}

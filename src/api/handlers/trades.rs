use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;

use crate::db::{alert_repo, trade_repo, Page};
use crate::errors::AppError;
use crate::models::{Alert, Trade};
use crate::AppState;

use super::{ApiResponse, PageQuery};

#[derive(Debug, Serialize)]
pub struct TradeDetail {
    #[serde(flatten)]
    pub trade: Trade,
    pub alert: Option<Alert>,
}

/// GET /api/trades, most recent first
pub async fn list(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Trade>>>, AppError> {
    let trades = trade_repo::list_trades(&state.db, Page::from(&q)).await?;
    Ok(Json(ApiResponse::ok(trades)))
}

/// GET /api/trades/{tx_hash}, with the trade's alert if it was flagged
pub async fn detail(
    State(state): State<AppState>,
    Path(tx_hash): Path<String>,
) -> Result<Json<ApiResponse<TradeDetail>>, AppError> {
    let trade = trade_repo::get_trade_by_hash(&state.db, &tx_hash)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("trade {tx_hash}")))?;
    let alert = alert_repo::get_alert_for_trade(&state.db, trade.id).await?;
    Ok(Json(ApiResponse::ok(TradeDetail { trade, alert })))
}

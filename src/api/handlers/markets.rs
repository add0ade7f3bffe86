use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::db::{market_repo, trade_repo, Page};
use crate::errors::AppError;
use crate::models::{Market, Trade};
use crate::AppState;

use super::{ApiResponse, PageQuery};

#[derive(Debug, Deserialize)]
pub struct MarketListQuery {
    pub resolved: Option<bool>,
    pub category: Option<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/markets
pub async fn list(
    State(state): State<AppState>,
    Query(q): Query<MarketListQuery>,
) -> Result<Json<ApiResponse<Vec<Market>>>, AppError> {
    let markets = market_repo::list_markets(
        &state.db,
        q.resolved,
        q.category.as_deref(),
        Page::new(q.skip, q.limit),
    )
    .await?;
    Ok(Json(ApiResponse::ok(markets)))
}

/// GET /api/markets/{market_id}
pub async fn detail(
    State(state): State<AppState>,
    Path(market_id): Path<String>,
) -> Result<Json<ApiResponse<Market>>, AppError> {
    let market = market_repo::get_market(&state.db, &market_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("market {market_id}")))?;
    Ok(Json(ApiResponse::ok(market)))
}

/// GET /api/markets/{market_id}/trades
pub async fn trades(
    State(state): State<AppState>,
    Path(market_id): Path<String>,
    Query(q): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Trade>>>, AppError> {
    let trades = trade_repo::get_trades_by_market(&state.db, &market_id, Page::from(&q)).await?;
    Ok(Json(ApiResponse::ok(trades)))
}

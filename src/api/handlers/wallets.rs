use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::{position_repo, trade_repo, wallet_repo, Page};
use crate::errors::AppError;
use crate::models::{Position, PositionStatus, Trade, Wallet, WalletStats};
use crate::AppState;

use super::{ApiResponse, PageQuery};

#[derive(Debug, Deserialize)]
pub struct WalletListQuery {
    #[serde(default)]
    pub fresh_only: bool,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PositionQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WalletDetail {
    #[serde(flatten)]
    pub wallet: Wallet,
    pub stats: WalletStats,
}

/// GET /api/wallets, newest first, optionally fresh wallets only
pub async fn list(
    State(state): State<AppState>,
    Query(q): Query<WalletListQuery>,
) -> Result<Json<ApiResponse<Vec<Wallet>>>, AppError> {
    let page = Page::new(q.skip, q.limit);
    let wallets = wallet_repo::list_wallets(&state.db, q.fresh_only, page).await?;
    Ok(Json(ApiResponse::ok(wallets)))
}

/// GET /api/wallets/{address}
pub async fn detail(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<WalletDetail>>, AppError> {
    let address = address.to_lowercase();
    let wallet = wallet_repo::get_wallet(&state.db, &address)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("wallet {address}")))?;

    let stats = WalletStats::from_wallet(&wallet, chrono::Utc::now());
    Ok(Json(ApiResponse::ok(WalletDetail { wallet, stats })))
}

/// GET /api/wallets/{address}/trades
pub async fn trades(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(q): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Trade>>>, AppError> {
    let address = address.to_lowercase();
    let trades = trade_repo::get_trades_by_wallet(&state.db, &address, Page::from(&q)).await?;
    Ok(Json(ApiResponse::ok(trades)))
}

/// GET /api/wallets/{address}/positions?status=open|closed|resolved
pub async fn positions(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(q): Query<PositionQuery>,
) -> Result<Json<ApiResponse<Vec<Position>>>, AppError> {
    let status = match q.status.as_deref() {
        None => None,
        Some(s) => Some(
            PositionStatus::from_str(s)
                .ok_or_else(|| AppError::BadRequest(format!("unknown position status: {s}")))?,
        ),
    };

    let address = address.to_lowercase();
    let positions =
        position_repo::get_positions_for_wallet(&state.db, &address, status.map(|s| s.as_str()))
            .await?;
    Ok(Json(ApiResponse::ok(positions)))
}

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{alert_repo, Page};
use crate::errors::AppError;
use crate::intelligence::alert_engine;
use crate::models::{Alert, AlertStatus};
use crate::AppState;

use super::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct AlertListQuery {
    pub status: Option<String>,
    pub min_risk_score: Option<i32>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/alerts, newest first
pub async fn list(
    State(state): State<AppState>,
    Query(q): Query<AlertListQuery>,
) -> Result<Json<ApiResponse<Vec<Alert>>>, AppError> {
    let status = match q.status.as_deref() {
        None => None,
        Some(s) => Some(
            AlertStatus::from_str(s)
                .ok_or_else(|| AppError::BadRequest(format!("unknown alert status: {s}")))?,
        ),
    };

    let alerts = alert_repo::list_alerts(
        &state.db,
        status,
        q.min_risk_score,
        Page::new(q.skip, q.limit),
    )
    .await?;
    Ok(Json(ApiResponse::ok(alerts)))
}

/// GET /api/alerts/{id}
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Alert>>, AppError> {
    let alert = alert_repo::get_alert(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("alert {id}")))?;
    Ok(Json(ApiResponse::ok(alert)))
}

/// POST /api/alerts/{id}/dismiss, 409 if the alert already settled
pub async fn dismiss(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Alert>>, AppError> {
    let alert = alert_engine::dismiss_alert(&state.db, id).await?;
    Ok(Json(ApiResponse::ok(alert)))
}

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use metrics::gauge;

use crate::db::{alert_repo, wallet_repo};
use crate::models::AlertStatus;
use crate::AppState;

/// Prometheus scrape. Store-backed gauges are refreshed first so they are
/// current even when the jobs are disabled.
pub async fn render(State(state): State<AppState>) -> impl IntoResponse {
    if let Ok(fresh) = wallet_repo::count_fresh_wallets(&state.db).await {
        gauge!("fresh_wallets").set(fresh as f64);
    }
    if let Ok(pending) = alert_repo::count_alerts(&state.db, Some(AlertStatus::Pending)).await {
        gauge!("pending_alerts").set(pending as f64);
    }

    let body = state.metrics_handle.render();
    ([(CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}

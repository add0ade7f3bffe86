use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::require_auth;
use super::handlers;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Public routes, no authentication required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Protected API routes, require Bearer token when API_TOKEN is set
    let protected = Router::new()
        // Wallets
        .route("/api/wallets", get(handlers::wallets::list))
        .route("/api/wallets/:address", get(handlers::wallets::detail))
        .route("/api/wallets/:address/trades", get(handlers::wallets::trades))
        .route("/api/wallets/:address/positions", get(handlers::wallets::positions))
        // Markets
        .route("/api/markets", get(handlers::markets::list))
        .route("/api/markets/:market_id", get(handlers::markets::detail))
        .route("/api/markets/:market_id/trades", get(handlers::markets::trades))
        // Alerts
        .route("/api/alerts", get(handlers::alerts::list))
        .route("/api/alerts/:id", get(handlers::alerts::detail))
        .route("/api/alerts/:id/dismiss", post(handlers::alerts::dismiss))
        // Trades
        .route("/api/trades", get(handlers::trades::list))
        .route("/api/trades/:tx_hash", get(handlers::trades::detail))
        // Analytics
        .route("/api/analytics/summary", get(handlers::analytics::summary))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

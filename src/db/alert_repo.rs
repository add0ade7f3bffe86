use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::Page;
use crate::models::{Alert, AlertStatus, NewAlert};

/// Insert an alert for a trade. The unique `trade_id` constraint makes this
/// the dedup point: a second insert for the same trade returns `None`.
pub async fn insert_alert(pool: &PgPool, alert: &NewAlert) -> anyhow::Result<Option<Alert>> {
    let row = sqlx::query_as::<_, Alert>(
        r#"
        INSERT INTO alerts (wallet_address, market_id, trade_id, risk_score, risk_factors,
                            position_size, potential_payout, market_resolution_date, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending')
        ON CONFLICT (trade_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(&alert.wallet_address)
    .bind(&alert.market_id)
    .bind(alert.trade_id)
    .bind(alert.risk_score)
    .bind(Json(alert.risk_factors))
    .bind(alert.position_size)
    .bind(alert.potential_payout)
    .bind(alert.market_resolution_date)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn alert_exists_for_trade(pool: &PgPool, trade_id: Uuid) -> anyhow::Result<bool> {
    let row: (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM alerts WHERE trade_id = $1)")
        .bind(trade_id)
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}

pub async fn get_alert(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<Alert>> {
    let row = sqlx::query_as::<_, Alert>("SELECT * FROM alerts WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_alert_for_trade(pool: &PgPool, trade_id: Uuid) -> anyhow::Result<Option<Alert>> {
    let row = sqlx::query_as::<_, Alert>("SELECT * FROM alerts WHERE trade_id = $1")
        .bind(trade_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Newest first, optionally filtered by status and minimum score.
pub async fn list_alerts(
    pool: &PgPool,
    status: Option<AlertStatus>,
    min_risk_score: Option<i32>,
    page: Page,
) -> anyhow::Result<Vec<Alert>> {
    let rows = sqlx::query_as::<_, Alert>(
        r#"
        SELECT * FROM alerts
        WHERE ($1::text IS NULL OR status = $1)
          AND ($2::integer IS NULL OR risk_score >= $2)
        ORDER BY flagged_at DESC
        OFFSET $3 LIMIT $4
        "#,
    )
    .bind(status.map(|s| s.as_str()))
    .bind(min_risk_score)
    .bind(page.skip)
    .bind(page.limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Move a pending alert to `to`. Returns `None` if the alert was no longer
/// pending when the update ran.
pub async fn transition_from_pending(
    pool: &PgPool,
    id: Uuid,
    to: AlertStatus,
    actual_return: Option<Decimal>,
) -> anyhow::Result<Option<Alert>> {
    let row = sqlx::query_as::<_, Alert>(
        r#"
        UPDATE alerts
        SET status = $2, actual_return = COALESCE($3, actual_return)
        WHERE id = $1 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(to.as_str())
    .bind(actual_return)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Pending alerts whose market has resolved with a known outcome.
pub async fn get_pending_on_resolved_markets(pool: &PgPool) -> anyhow::Result<Vec<Alert>> {
    let rows = sqlx::query_as::<_, Alert>(
        r#"
        SELECT a.* FROM alerts a
        JOIN markets m ON m.market_id = a.market_id
        WHERE a.status = 'pending' AND m.resolved = true AND m.outcome IS NOT NULL
        ORDER BY a.flagged_at ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn count_alerts(pool: &PgPool, status: Option<AlertStatus>) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM alerts WHERE ($1::text IS NULL OR status = $1)",
    )
    .bind(status.map(|s| s.as_str()))
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

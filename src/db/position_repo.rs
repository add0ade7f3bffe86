use sqlx::{PgExecutor, PgPool};

use crate::models::{Position, PositionState};

pub async fn get_position<'e>(
    executor: impl PgExecutor<'e>,
    wallet_address: &str,
    market_id: &str,
) -> anyhow::Result<Option<Position>> {
    let position = sqlx::query_as::<_, Position>(
        "SELECT * FROM positions WHERE wallet_address = $1 AND market_id = $2",
    )
    .bind(wallet_address)
    .bind(market_id)
    .fetch_optional(executor)
    .await?;

    Ok(position)
}

/// Write the aggregate for a (wallet, market) pair.
pub async fn save_position<'e>(
    executor: impl PgExecutor<'e>,
    wallet_address: &str,
    market_id: &str,
    state: &PositionState,
) -> anyhow::Result<Position> {
    let position = sqlx::query_as::<_, Position>(
        r#"
        INSERT INTO positions (wallet_address, market_id, shares, avg_purchase_price, total_invested, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (wallet_address, market_id) DO UPDATE
            SET shares = EXCLUDED.shares,
                avg_purchase_price = EXCLUDED.avg_purchase_price,
                total_invested = EXCLUDED.total_invested,
                status = EXCLUDED.status,
                updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(wallet_address)
    .bind(market_id)
    .bind(state.shares)
    .bind(state.avg_purchase_price)
    .bind(state.total_invested)
    .bind(state.status.as_str())
    .fetch_one(executor)
    .await?;

    Ok(position)
}

pub async fn get_positions_for_wallet(
    pool: &PgPool,
    wallet_address: &str,
    status: Option<&str>,
) -> anyhow::Result<Vec<Position>> {
    let positions = sqlx::query_as::<_, Position>(
        r#"
        SELECT * FROM positions
        WHERE wallet_address = $1 AND ($2::text IS NULL OR status = $2)
        ORDER BY updated_at DESC
        "#,
    )
    .bind(wallet_address)
    .bind(status)
    .fetch_all(pool)
    .await?;

    Ok(positions)
}

/// Freeze every non-resolved position in a market. Returns rows touched.
pub async fn mark_resolved_for_market(pool: &PgPool, market_id: &str) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE positions
        SET status = 'resolved', updated_at = NOW()
        WHERE market_id = $1 AND status <> 'resolved'
        "#,
    )
    .bind(market_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};

use super::Page;
use crate::models::{Market, NewMarket};

/// Insert or fully refresh a market from upstream metadata.
pub async fn upsert_market(pool: &PgPool, market: &NewMarket) -> anyhow::Result<Market> {
    let row = sqlx::query_as::<_, Market>(
        r#"
        INSERT INTO markets (market_id, title, description, category, end_date, resolution_date,
                             resolved, outcome, total_volume, holder_count, metadata)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (market_id) DO UPDATE
            SET title = EXCLUDED.title,
                description = EXCLUDED.description,
                category = EXCLUDED.category,
                end_date = EXCLUDED.end_date,
                resolution_date = EXCLUDED.resolution_date,
                resolved = EXCLUDED.resolved,
                outcome = EXCLUDED.outcome,
                total_volume = EXCLUDED.total_volume,
                holder_count = EXCLUDED.holder_count,
                metadata = EXCLUDED.metadata,
                updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(&market.market_id)
    .bind(&market.title)
    .bind(&market.description)
    .bind(&market.category)
    .bind(market.end_date)
    .bind(market.resolution_date)
    .bind(market.resolved)
    .bind(&market.outcome)
    .bind(market.total_volume)
    .bind(market.holder_count)
    .bind(market.metadata.clone().map(Json))
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Insert a market only if it is not stored yet. Used for the thin records
/// embedded in trades, which must never clobber full metadata.
pub async fn insert_market_if_absent<'e>(
    executor: impl PgExecutor<'e>,
    market: &NewMarket,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO markets (market_id, title, category, resolved, outcome, metadata)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (market_id) DO NOTHING
        "#,
    )
    .bind(&market.market_id)
    .bind(&market.title)
    .bind(&market.category)
    .bind(market.resolved)
    .bind(&market.outcome)
    .bind(market.metadata.clone().map(Json))
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn get_market(pool: &PgPool, market_id: &str) -> anyhow::Result<Option<Market>> {
    let row = sqlx::query_as::<_, Market>("SELECT * FROM markets WHERE market_id = $1")
        .bind(market_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn list_markets(
    pool: &PgPool,
    resolved: Option<bool>,
    category: Option<&str>,
    page: Page,
) -> anyhow::Result<Vec<Market>> {
    let rows = sqlx::query_as::<_, Market>(
        r#"
        SELECT * FROM markets
        WHERE ($1::boolean IS NULL OR resolved = $1)
          AND ($2::text IS NULL OR category = $2)
        ORDER BY updated_at DESC
        OFFSET $3 LIMIT $4
        "#,
    )
    .bind(resolved)
    .bind(category)
    .bind(page.skip)
    .bind(page.limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Unresolved markets that still have pending alerts; the resolution job
/// refreshes these from upstream.
pub async fn get_unresolved_with_pending_alerts(pool: &PgPool) -> anyhow::Result<Vec<Market>> {
    let rows = sqlx::query_as::<_, Market>(
        r#"
        SELECT m.* FROM markets m
        WHERE m.resolved = false
          AND EXISTS (SELECT 1 FROM alerts a WHERE a.market_id = m.market_id AND a.status = 'pending')
        ORDER BY m.market_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

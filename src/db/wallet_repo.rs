use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};

use super::Page;
use crate::models::Wallet;

/// Create a wallet on first sight, otherwise advance its last activity.
/// `first_seen_date` is never touched after the insert.
pub async fn upsert_wallet<'e>(
    executor: impl PgExecutor<'e>,
    address: &str,
    activity_at: DateTime<Utc>,
) -> anyhow::Result<Wallet> {
    let wallet = sqlx::query_as::<_, Wallet>(
        r#"
        INSERT INTO wallets (address, first_seen_date, last_activity_date, is_fresh)
        VALUES ($1, $2, $2, true)
        ON CONFLICT (address) DO UPDATE
            SET last_activity_date = GREATEST(wallets.last_activity_date, EXCLUDED.last_activity_date),
                updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(address)
    .bind(activity_at)
    .fetch_one(executor)
    .await?;

    Ok(wallet)
}

pub async fn get_wallet(pool: &PgPool, address: &str) -> anyhow::Result<Option<Wallet>> {
    let wallet = sqlx::query_as::<_, Wallet>("SELECT * FROM wallets WHERE address = $1")
        .bind(address)
        .fetch_optional(pool)
        .await?;

    Ok(wallet)
}

pub async fn list_wallets(
    pool: &PgPool,
    fresh_only: bool,
    page: Page,
) -> anyhow::Result<Vec<Wallet>> {
    let wallets = sqlx::query_as::<_, Wallet>(
        r#"
        SELECT * FROM wallets
        WHERE ($1 = false OR is_fresh = true)
        ORDER BY first_seen_date DESC
        OFFSET $2 LIMIT $3
        "#,
    )
    .bind(fresh_only)
    .bind(page.skip)
    .bind(page.limit)
    .fetch_all(pool)
    .await?;

    Ok(wallets)
}

/// All wallet addresses, for the stats sweep.
pub async fn get_all_addresses(pool: &PgPool) -> anyhow::Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT address FROM wallets ORDER BY address")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|r| r.0).collect())
}

pub async fn update_wallet_stats(
    pool: &PgPool,
    address: &str,
    total_trades: i32,
    total_volume: Decimal,
    lifetime_pnl: Decimal,
    last_activity: Option<DateTime<Utc>>,
    is_fresh: bool,
) -> anyhow::Result<Wallet> {
    let wallet = sqlx::query_as::<_, Wallet>(
        r#"
        UPDATE wallets
        SET total_trades = $2,
            total_volume = $3,
            lifetime_pnl = $4,
            last_activity_date = $5,
            is_fresh = $6,
            updated_at = NOW()
        WHERE address = $1
        RETURNING *
        "#,
    )
    .bind(address)
    .bind(total_trades)
    .bind(total_volume)
    .bind(lifetime_pnl)
    .bind(last_activity)
    .bind(is_fresh)
    .fetch_one(pool)
    .await?;

    Ok(wallet)
}

pub async fn count_wallets(pool: &PgPool) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM wallets")
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}

pub async fn count_fresh_wallets(pool: &PgPool) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM wallets WHERE is_fresh = true")
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}

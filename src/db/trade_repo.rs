use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};

use super::Page;
use crate::models::{NewTrade, Trade};

/// Aggregate view of a wallet's trades.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TradeSummary {
    pub trade_count: i64,
    pub total_volume: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub last_trade_at: Option<DateTime<Utc>>,
}

/// A trade joined with the outcome of its resolved market.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SettledTrade {
    pub side: String,
    pub outcome: Option<String>,
    pub shares: Decimal,
    pub token_amount: Decimal,
    pub market_outcome: String,
}

/// Insert a trade. Returns `None` when the tx hash is already stored.
pub async fn insert_trade<'e>(
    executor: impl PgExecutor<'e>,
    trade: &NewTrade,
) -> anyhow::Result<Option<Trade>> {
    let row = sqlx::query_as::<_, Trade>(
        r#"
        INSERT INTO trades (tx_hash, wallet_address, market_id, side, outcome, token_amount, shares, price, traded_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (tx_hash) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(&trade.tx_hash)
    .bind(&trade.wallet_address)
    .bind(&trade.market_id)
    .bind(trade.side.as_str())
    .bind(&trade.outcome)
    .bind(trade.token_amount)
    .bind(trade.shares)
    .bind(trade.price)
    .bind(trade.traded_at)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

pub async fn trade_exists(pool: &PgPool, tx_hash: &str) -> anyhow::Result<bool> {
    let row: (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM trades WHERE tx_hash = $1)")
        .bind(tx_hash)
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}

pub async fn get_trade_by_id(pool: &PgPool, id: uuid::Uuid) -> anyhow::Result<Option<Trade>> {
    let trade = sqlx::query_as::<_, Trade>("SELECT * FROM trades WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(trade)
}

pub async fn get_trade_by_hash(pool: &PgPool, tx_hash: &str) -> anyhow::Result<Option<Trade>> {
    let trade = sqlx::query_as::<_, Trade>("SELECT * FROM trades WHERE tx_hash = $1")
        .bind(tx_hash)
        .fetch_optional(pool)
        .await?;

    Ok(trade)
}

/// Most recent trades first.
pub async fn list_trades(pool: &PgPool, page: Page) -> anyhow::Result<Vec<Trade>> {
    let trades = sqlx::query_as::<_, Trade>(
        "SELECT * FROM trades ORDER BY traded_at DESC OFFSET $1 LIMIT $2",
    )
    .bind(page.skip)
    .bind(page.limit)
    .fetch_all(pool)
    .await?;

    Ok(trades)
}

pub async fn get_trades_by_wallet(
    pool: &PgPool,
    address: &str,
    page: Page,
) -> anyhow::Result<Vec<Trade>> {
    let trades = sqlx::query_as::<_, Trade>(
        r#"
        SELECT * FROM trades
        WHERE wallet_address = $1
        ORDER BY traded_at DESC
        OFFSET $2 LIMIT $3
        "#,
    )
    .bind(address)
    .bind(page.skip)
    .bind(page.limit)
    .fetch_all(pool)
    .await?;

    Ok(trades)
}

pub async fn get_trades_by_market(
    pool: &PgPool,
    market_id: &str,
    page: Page,
) -> anyhow::Result<Vec<Trade>> {
    let trades = sqlx::query_as::<_, Trade>(
        r#"
        SELECT * FROM trades
        WHERE market_id = $1
        ORDER BY traded_at DESC
        OFFSET $2 LIMIT $3
        "#,
    )
    .bind(market_id)
    .bind(page.skip)
    .bind(page.limit)
    .fetch_all(pool)
    .await?;

    Ok(trades)
}

/// Trades the detector has not analyzed yet, oldest first.
pub async fn get_unscored(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<Trade>> {
    let trades = sqlx::query_as::<_, Trade>(
        r#"
        SELECT * FROM trades
        WHERE scored_at IS NULL
        ORDER BY traded_at ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(trades)
}

pub async fn mark_scored(pool: &PgPool, id: uuid::Uuid) -> anyhow::Result<()> {
    sqlx::query("UPDATE trades SET scored_at = NOW() WHERE id = $1 AND scored_at IS NULL")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Count, max amount and latest timestamp over a wallet's trades strictly
/// before `before`.
pub async fn summarize_before(
    pool: &PgPool,
    address: &str,
    before: DateTime<Utc>,
) -> anyhow::Result<TradeSummary> {
    let summary = sqlx::query_as::<_, TradeSummary>(
        r#"
        SELECT COUNT(*) AS trade_count,
               SUM(token_amount) AS total_volume,
               MAX(token_amount) AS max_amount,
               MAX(traded_at) AS last_trade_at
        FROM trades
        WHERE wallet_address = $1 AND traded_at < $2
        "#,
    )
    .bind(address)
    .bind(before)
    .fetch_one(pool)
    .await?;

    Ok(summary)
}

/// Same aggregate over every stored trade of the wallet.
pub async fn summarize_wallet(pool: &PgPool, address: &str) -> anyhow::Result<TradeSummary> {
    let summary = sqlx::query_as::<_, TradeSummary>(
        r#"
        SELECT COUNT(*) AS trade_count,
               SUM(token_amount) AS total_volume,
               MAX(token_amount) AS max_amount,
               MAX(traded_at) AS last_trade_at
        FROM trades
        WHERE wallet_address = $1
        "#,
    )
    .bind(address)
    .fetch_one(pool)
    .await?;

    Ok(summary)
}

/// Trades by `address` in the trailing window ending at `at`, inclusive on
/// both ends.
pub async fn count_trades_in_window(
    pool: &PgPool,
    address: &str,
    at: DateTime<Utc>,
    window: Duration,
) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM trades
        WHERE wallet_address = $1 AND traded_at >= $2 AND traded_at <= $3
        "#,
    )
    .bind(address)
    .bind(at - window)
    .bind(at)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

pub async fn get_settled_trades_for_wallet(
    pool: &PgPool,
    address: &str,
) -> anyhow::Result<Vec<SettledTrade>> {
    let rows = sqlx::query_as::<_, SettledTrade>(
        r#"
        SELECT t.side, t.outcome, t.shares, t.token_amount, m.outcome AS market_outcome
        FROM trades t
        JOIN markets m ON m.market_id = t.market_id
        WHERE t.wallet_address = $1 AND m.resolved = true AND m.outcome IS NOT NULL
        "#,
    )
    .bind(address)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn count_trades(pool: &PgPool) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM trades")
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use polysentry::db::market_repo;
use polysentry::ingestion::{ingest_trade, IngestOutcome};
use polysentry::models::{Market, NewMarket, NewTrade, Side, Trade};

/// Connect to the test database and run all migrations. Returns `None` when
/// `TEST_DATABASE_URL` is unset so database tests skip instead of failing.
///
/// Tests share the database, so every test seeds its own unique wallets and
/// markets instead of truncating tables.
#[allow(dead_code)]
pub async fn setup_test_db() -> Option<PgPool> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping database test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

/// Current time at whole-second precision, so values survive a round trip
/// through a microsecond TIMESTAMPTZ column unchanged.
#[allow(dead_code)]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Unique identifier with a readable prefix.
#[allow(dead_code)]
pub fn unique(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
}

/// Seed a market with full metadata.
#[allow(dead_code)]
pub async fn seed_market(
    pool: &PgPool,
    market_id: &str,
    total_volume: Option<Decimal>,
    category: Option<&str>,
    resolution_date: Option<DateTime<Utc>>,
) -> Market {
    let market = NewMarket {
        market_id: market_id.into(),
        title: format!("Test market {market_id}"),
        description: None,
        category: category.map(String::from),
        end_date: resolution_date,
        resolution_date,
        resolved: false,
        outcome: None,
        total_volume,
        holder_count: None,
        metadata: None,
    };

    market_repo::upsert_market(pool, &market)
        .await
        .expect("Failed to seed market")
}

/// Build a canonical trade. `amount` is the USDC cost.
#[allow(dead_code)]
pub fn new_trade(
    wallet: &str,
    market_id: &str,
    amount: Decimal,
    price: Decimal,
    traded_at: DateTime<Utc>,
) -> NewTrade {
    NewTrade {
        tx_hash: unique("0xtx"),
        wallet_address: wallet.into(),
        market_id: market_id.into(),
        side: Side::Buy,
        outcome: Some("Yes".into()),
        token_amount: amount,
        shares: amount / price,
        price,
        traded_at,
    }
}

/// Ingest a trade and return the stored row.
#[allow(dead_code)]
pub async fn seed_trade(pool: &PgPool, trade: &NewTrade) -> Trade {
    match ingest_trade(pool, trade, None)
        .await
        .expect("Failed to ingest trade")
    {
        IngestOutcome::Inserted(t) => t,
        IngestOutcome::Duplicate => panic!("seed trade {} already stored", trade.tx_hash),
    }
}

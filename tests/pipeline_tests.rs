mod common;

use chrono::Duration;
use rust_decimal_macros::dec;

use polysentry::db::{market_repo, position_repo, trade_repo, wallet_repo};
use polysentry::ingestion::{ingest_trade, store_market, IngestOutcome};
use polysentry::intelligence::classifier::{self, FreshnessRules};
use polysentry::models::{NewMarket, PositionStatus, Side};

#[tokio::test]
async fn test_ingest_creates_wallet_market_and_trade() {
    let Some(pool) = common::setup_test_db().await else { return };
    let wallet = common::unique("0xwallet");
    let market = common::unique("market");
    let at = common::now() - Duration::hours(2);

    let trade = common::new_trade(&wallet, &market, dec!(500), dec!(0.25), at);
    let outcome = ingest_trade(&pool, &trade, None).await.unwrap();
    assert!(outcome.is_inserted());

    let stored_wallet = wallet_repo::get_wallet(&pool, &wallet).await.unwrap().unwrap();
    assert_eq!(stored_wallet.first_seen_date, at);
    assert!(stored_wallet.is_fresh);

    let stored_market = market_repo::get_market(&pool, &market).await.unwrap().unwrap();
    assert_eq!(stored_market.total_volume, None);

    let stored_trade = trade_repo::get_trade_by_hash(&pool, &trade.tx_hash)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored_trade.token_amount, dec!(500));
    assert_eq!(stored_trade.side(), Some(Side::Buy));
}

#[tokio::test]
async fn test_duplicate_tx_hash_is_ignored() {
    let Some(pool) = common::setup_test_db().await else { return };
    let wallet = common::unique("0xwallet");
    let market = common::unique("market");

    let trade = common::new_trade(&wallet, &market, dec!(100), dec!(0.5), common::now());
    common::seed_trade(&pool, &trade).await;

    let again = ingest_trade(&pool, &trade, None).await.unwrap();
    assert!(matches!(again, IngestOutcome::Duplicate));

    let trades = trade_repo::get_trades_by_wallet(&pool, &wallet, Default::default())
        .await
        .unwrap();
    assert_eq!(trades.len(), 1);
}

#[tokio::test]
async fn test_trade_stub_never_overwrites_market_metadata() {
    let Some(pool) = common::setup_test_db().await else { return };
    let wallet = common::unique("0xwallet");
    let market_id = common::unique("market");

    common::seed_market(
        &pool,
        &market_id,
        Some(dec!(250000)),
        Some("sports"),
        Some(common::now() + Duration::days(10)),
    )
    .await;

    let stub = NewMarket {
        market_id: market_id.clone(),
        title: "stub title".into(),
        description: None,
        category: None,
        end_date: None,
        resolution_date: None,
        resolved: false,
        outcome: None,
        total_volume: None,
        holder_count: None,
        metadata: None,
    };
    let trade = common::new_trade(&wallet, &market_id, dec!(100), dec!(0.5), common::now());
    ingest_trade(&pool, &trade, Some(&stub)).await.unwrap();

    let market = market_repo::get_market(&pool, &market_id).await.unwrap().unwrap();
    assert_eq!(market.total_volume, Some(dec!(250000)));
    assert_eq!(market.category.as_deref(), Some("sports"));
    assert_ne!(market.title, "stub title");
}

#[tokio::test]
async fn test_store_market_refreshes_existing_row() {
    let Some(pool) = common::setup_test_db().await else { return };
    let market_id = common::unique("market");

    common::seed_market(&pool, &market_id, Some(dec!(1000)), None, None).await;

    let resolved_at = common::now();
    let update = NewMarket {
        market_id: market_id.clone(),
        title: "Resolved market".into(),
        description: None,
        category: Some("legal".into()),
        end_date: Some(resolved_at),
        resolution_date: Some(resolved_at),
        resolved: true,
        outcome: Some("No".into()),
        total_volume: Some(dec!(2000)),
        holder_count: Some(12),
        metadata: Some(serde_json::json!({ "closed": true })),
    };
    let stored = store_market(&pool, &update).await.unwrap();

    assert!(stored.resolved);
    assert_eq!(stored.outcome.as_deref(), Some("No"));
    assert_eq!(stored.total_volume, Some(dec!(2000)));
    assert_eq!(stored.holder_count, Some(12));
}

#[tokio::test]
async fn test_positions_track_buys_and_sells() {
    let Some(pool) = common::setup_test_db().await else { return };
    let wallet = common::unique("0xwallet");
    let market = common::unique("market");
    let now = common::now();

    // 200 shares at 0.25
    let buy = common::new_trade(&wallet, &market, dec!(50), dec!(0.25), now - Duration::hours(3));
    common::seed_trade(&pool, &buy).await;

    let position = position_repo::get_position(&pool, &wallet, &market)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(position.shares, dec!(200));
    assert_eq!(position.avg_purchase_price, dec!(0.25));
    assert_eq!(position.status, PositionStatus::Open.as_str());

    let mut sell = common::new_trade(&wallet, &market, dec!(100), dec!(0.5), now);
    sell.side = Side::Sell;
    common::seed_trade(&pool, &sell).await;

    let position = position_repo::get_position(&pool, &wallet, &market)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(position.shares, dec!(0));
    assert_eq!(position.status, PositionStatus::Closed.as_str());
}

/// Make every position write for markets named `rejected_*` fail.
async fn reject_position_writes(pool: &sqlx::PgPool) {
    sqlx::query(
        r#"
        CREATE OR REPLACE FUNCTION reject_test_positions() RETURNS trigger AS $$
        BEGIN
            IF NEW.market_id LIKE 'rejected\_%' THEN
                RAISE EXCEPTION 'position write rejected';
            END IF;
            RETURN NEW;
        END
        $$ LANGUAGE plpgsql
        "#,
    )
    .execute(pool)
    .await
    .unwrap();

    sqlx::query("DROP TRIGGER IF EXISTS reject_test_positions ON positions")
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(
        "CREATE TRIGGER reject_test_positions BEFORE INSERT OR UPDATE ON positions \
         FOR EACH ROW EXECUTE FUNCTION reject_test_positions()",
    )
    .execute(pool)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_failed_position_write_rolls_back_trade() {
    let Some(pool) = common::setup_test_db().await else { return };
    reject_position_writes(&pool).await;

    let wallet = common::unique("0xwallet");
    let market = common::unique("rejected");
    let trade = common::new_trade(&wallet, &market, dec!(100), dec!(0.5), common::now());

    assert!(ingest_trade(&pool, &trade, None).await.is_err());

    // Nothing from the failed attempt is left behind.
    assert!(trade_repo::get_trade_by_hash(&pool, &trade.tx_hash)
        .await
        .unwrap()
        .is_none());
    assert!(wallet_repo::get_wallet(&pool, &wallet).await.unwrap().is_none());

    // So the next pass retries the trade instead of skipping it as a duplicate.
    assert!(ingest_trade(&pool, &trade, None).await.is_err());
}

#[tokio::test]
async fn test_create_or_touch_keeps_first_seen() {
    let Some(pool) = common::setup_test_db().await else { return };
    let wallet = common::unique("0xwallet");
    let first = common::now() - Duration::days(3);
    let later = common::now() - Duration::days(1);

    classifier::create_or_touch(&pool, &wallet, first).await.unwrap();
    classifier::create_or_touch(&pool, &wallet, later).await.unwrap();
    // An older timestamp never moves last activity backwards.
    let touched = classifier::create_or_touch(&pool, &wallet, first).await.unwrap();

    assert_eq!(touched.first_seen_date, first);
    assert_eq!(touched.last_activity_date, Some(later));
    assert!(touched.is_fresh);
}

#[tokio::test]
async fn test_recompute_stats_latches_freshness() {
    let Some(pool) = common::setup_test_db().await else { return };
    let wallet = common::unique("0xwallet");
    let market = common::unique("market");
    let rules = FreshnessRules::default();
    let start = common::now() - Duration::days(2);

    // One trade above the historical max makes the wallet non-fresh.
    let whale = common::new_trade(&wallet, &market, dec!(15000), dec!(0.5), start);
    common::seed_trade(&pool, &whale).await;

    let stats = classifier::recompute_stats(&pool, &rules, &wallet).await.unwrap();
    assert!(!stats.is_fresh);
    assert_eq!(stats.total_trades, 1);
    assert_eq!(stats.total_volume, dec!(15000));
    assert_eq!(stats.last_activity, Some(start));

    // Recomputing again never flips it back.
    let again = classifier::recompute_stats(&pool, &rules, &wallet).await.unwrap();
    assert!(!again.is_fresh);
    assert_eq!(again.total_trades, 1);
}

#[tokio::test]
async fn test_wallet_stats_for_unknown_address() {
    let Some(pool) = common::setup_test_db().await else { return };

    let stats = classifier::wallet_stats(&pool, &common::unique("0xnobody"))
        .await
        .unwrap();

    assert!(!stats.exists);
    assert!(stats.is_fresh);
    assert_eq!(stats.total_trades, 0);
}

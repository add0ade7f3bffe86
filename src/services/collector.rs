use std::collections::BTreeSet;

use metrics::counter;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::ingestion::normalize::parse_trade_timestamp;
use crate::ingestion::{ingest_trade, store_market, IngestOutcome};
use crate::intelligence::classifier::FreshnessRules;
use crate::models::{NewMarket, NewTrade};
use crate::polymarket::{ApiTrade, DataClient, GammaClient};
use crate::services::wallet_stats;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionReport {
    pub fetched: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub failed: usize,
    pub markets_stored: usize,
}

/// Oldest first. Records without a readable timestamp sort to the front and
/// are rejected during normalization.
pub fn sort_oldest_first(trades: &mut [ApiTrade]) {
    trades.sort_by_key(|t| t.timestamp.as_ref().and_then(parse_trade_timestamp));
}

/// One collection pass: pull the latest trades, ingest them in timestamp
/// order, refresh the touched wallets, then refresh active market metadata.
pub async fn run_collection_pass(
    pool: &PgPool,
    data_client: &DataClient,
    gamma_client: &GammaClient,
    config: &AppConfig,
) -> anyhow::Result<CollectionReport> {
    let mut report = CollectionReport::default();

    let mut raw_trades = data_client
        .get_recent_trades(config.trades_fetch_limit, 0)
        .await?;
    report.fetched = raw_trades.len();
    sort_oldest_first(&mut raw_trades);

    let mut touched: BTreeSet<String> = BTreeSet::new();

    for raw in &raw_trades {
        let trade = match NewTrade::try_from(raw) {
            Ok(t) => t,
            Err(e) => {
                counter!("trades_rejected_total").increment(1);
                tracing::debug!(error = %e, tx = ?raw.transaction_hash, "Trade rejected");
                report.rejected += 1;
                continue;
            }
        };
        let stub = NewMarket::stub_from_trade(raw);

        match ingest_trade(pool, &trade, stub.as_ref()).await {
            Ok(IngestOutcome::Inserted(_)) => {
                report.inserted += 1;
                touched.insert(trade.wallet_address.clone());
            }
            Ok(IngestOutcome::Duplicate) => report.duplicates += 1,
            Err(e) => {
                tracing::error!(error = %e, tx = %trade.tx_hash, "Trade ingestion failed");
                report.failed += 1;
            }
        }
    }

    let rules = FreshnessRules::from(&config.detection);
    let touched: Vec<String> = touched.into_iter().collect();
    wallet_stats::refresh_wallets(pool, &rules, &touched).await;

    // Market metadata is best effort; a Gamma outage must not fail the pass.
    match gamma_client
        .get_markets(config.markets_fetch_limit, 0, Some(true))
        .await
    {
        Ok(markets) => {
            for raw in &markets {
                let market = match NewMarket::try_from(raw) {
                    Ok(m) => m,
                    Err(e) => {
                        tracing::debug!(error = %e, "Market rejected");
                        continue;
                    }
                };
                match store_market(pool, &market).await {
                    Ok(_) => report.markets_stored += 1,
                    Err(e) => {
                        tracing::error!(error = %e, market = %market.market_id, "Market store failed");
                    }
                }
            }
        }
        Err(e) => tracing::warn!(error = %e, "Market fetch failed"),
    }

    tracing::info!(
        fetched = report.fetched,
        inserted = report.inserted,
        duplicates = report.duplicates,
        rejected = report.rejected,
        failed = report.failed,
        markets = report.markets_stored,
        "Collection pass complete"
    );

    Ok(report)
}

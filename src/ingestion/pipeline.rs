use metrics::counter;
use sqlx::PgPool;

use crate::db::{market_repo, position_repo, trade_repo};
use crate::intelligence::classifier;
use crate::models::{Market, NewMarket, NewTrade, PositionState, Trade};

#[derive(Debug, Clone)]
pub enum IngestOutcome {
    Inserted(Trade),
    Duplicate,
}

impl IngestOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, IngestOutcome::Inserted(_))
    }
}

/// Market row used when a trade arrives with no embedded market data at all.
fn placeholder_market(market_id: &str) -> NewMarket {
    NewMarket {
        market_id: market_id.to_string(),
        title: market_id.to_string(),
        description: None,
        category: None,
        end_date: None,
        resolution_date: None,
        resolved: false,
        outcome: None,
        total_volume: None,
        holder_count: None,
        metadata: None,
    }
}

/// Persist one canonical trade:
/// 1. Skip if the tx hash is already stored
/// 2. Make sure the market row exists (never overwriting richer data)
/// 3. Create or touch the wallet
/// 4. Insert the trade
/// 5. Fold it into the wallet's position for that market
///
/// Steps 2-5 commit together, so a failed pass leaves nothing behind and the
/// trade is retried in full on the next one.
pub async fn ingest_trade(
    pool: &PgPool,
    trade: &NewTrade,
    market_stub: Option<&NewMarket>,
) -> anyhow::Result<IngestOutcome> {
    if trade_repo::trade_exists(pool, &trade.tx_hash).await? {
        counter!("trades_duplicate_total").increment(1);
        return Ok(IngestOutcome::Duplicate);
    }

    let market = market_stub
        .cloned()
        .unwrap_or_else(|| placeholder_market(&trade.market_id));

    let mut tx = pool.begin().await?;

    market_repo::insert_market_if_absent(&mut *tx, &market).await?;
    classifier::create_or_touch(&mut *tx, &trade.wallet_address, trade.traded_at).await?;

    // Another writer may have won the race since the existence check.
    let Some(stored) = trade_repo::insert_trade(&mut *tx, trade).await? else {
        tx.rollback().await?;
        counter!("trades_duplicate_total").increment(1);
        return Ok(IngestOutcome::Duplicate);
    };

    let current = position_repo::get_position(&mut *tx, &trade.wallet_address, &trade.market_id)
        .await?
        .map(|p| PositionState::from(&p))
        .unwrap_or_default();
    let next = current.apply(trade.side, trade.shares, trade.price);
    if next != current {
        position_repo::save_position(&mut *tx, &trade.wallet_address, &trade.market_id, &next)
            .await?;
    }

    tx.commit().await?;

    counter!("trades_ingested_total").increment(1);
    tracing::debug!(trade = %trade, "Trade ingested");

    Ok(IngestOutcome::Inserted(stored))
}

/// Insert or refresh a market from full upstream metadata.
pub async fn store_market(pool: &PgPool, market: &NewMarket) -> anyhow::Result<Market> {
    let stored = market_repo::upsert_market(pool, market).await?;
    tracing::debug!(market = %stored.market_id, resolved = stored.resolved, "Market stored");
    Ok(stored)
}

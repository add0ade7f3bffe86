use std::collections::{BTreeSet, HashMap};

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::db::{alert_repo, market_repo, position_repo, trade_repo};
use crate::ingestion::store_market;
use crate::intelligence::alert_engine;
use crate::intelligence::classifier::FreshnessRules;
use crate::intelligence::settlement;
use crate::models::{Alert, Market, NewMarket, Trade};
use crate::polymarket::GammaClient;
use crate::services::wallet_stats;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    pub markets_refreshed: usize,
    pub alerts_settled: usize,
    pub alerts_skipped: usize,
    pub positions_resolved: u64,
}

/// Decide a pending alert against its resolved market. Returns `(won,
/// actual_return)`, or `None` when the trade's outcome label or side is unknown.
pub fn settle_outcome(trade: &Trade, market: &Market) -> Option<(bool, Decimal)> {
    let market_outcome = market.outcome.as_deref()?;
    let trade_outcome = trade.outcome.as_deref()?;
    let side = trade.side()?;

    let won = settlement::trade_won(side, trade_outcome, market_outcome);
    let actual_return = settlement::settlement_return(side, trade.shares, trade.token_amount, won);
    Some((won, actual_return))
}

/// Refresh markets that still have pending alerts from Gamma.
async fn refresh_watched_markets(
    pool: &PgPool,
    gamma_client: &GammaClient,
) -> anyhow::Result<usize> {
    let watched = market_repo::get_unresolved_with_pending_alerts(pool).await?;
    let mut refreshed = 0;

    for market in &watched {
        let raw = match gamma_client.get_market_by_slug(&market.market_id).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(market = %market.market_id, "Market unknown upstream");
                continue;
            }
            Err(e) => {
                tracing::warn!(error = %e, market = %market.market_id, "Market refresh failed");
                continue;
            }
        };

        let mut update = match NewMarket::try_from(&raw) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, market = %market.market_id, "Upstream market rejected");
                continue;
            }
        };
        // Keep our key even if upstream falls back to a condition id.
        update.market_id = market.market_id.clone();

        match store_market(pool, &update).await {
            Ok(stored) => {
                refreshed += 1;
                if stored.resolved {
                    tracing::info!(
                        market = %stored.market_id,
                        outcome = ?stored.outcome,
                        "Market resolved"
                    );
                }
            }
            Err(e) => tracing::error!(error = %e, market = %market.market_id, "Market store failed"),
        }
    }

    Ok(refreshed)
}

async fn settle_alert_row(
    pool: &PgPool,
    alert: &Alert,
    markets: &mut HashMap<String, Market>,
) -> anyhow::Result<bool> {
    let Some(trade_id) = alert.trade_id else {
        return Ok(false);
    };
    let Some(trade) = trade_repo::get_trade_by_id(pool, trade_id).await? else {
        return Ok(false);
    };

    if !markets.contains_key(&alert.market_id) {
        let Some(m) = market_repo::get_market(pool, &alert.market_id).await? else {
            return Ok(false);
        };
        markets.insert(alert.market_id.clone(), m);
    }
    let Some(market) = markets.get(&alert.market_id) else {
        return Ok(false);
    };

    let Some((won, actual_return)) = settle_outcome(&trade, market) else {
        tracing::debug!(alert_id = %alert.id, "Trade outcome unknown, leaving alert pending");
        return Ok(false);
    };

    alert_engine::settle_alert(pool, alert.id, won, actual_return).await?;
    Ok(true)
}

/// One resolution pass: refresh watched markets, settle pending alerts on
/// resolved markets, freeze their positions and recompute the affected
/// wallets' P&L.
pub async fn run_resolution_pass(
    pool: &PgPool,
    gamma_client: &GammaClient,
    rules: &FreshnessRules,
) -> anyhow::Result<ResolutionReport> {
    let mut report = ResolutionReport {
        markets_refreshed: refresh_watched_markets(pool, gamma_client).await?,
        ..ResolutionReport::default()
    };

    let pending = alert_repo::get_pending_on_resolved_markets(pool).await?;
    let mut markets: HashMap<String, Market> = HashMap::new();
    let mut resolved_markets: BTreeSet<String> = BTreeSet::new();
    let mut wallets: BTreeSet<String> = BTreeSet::new();

    for alert in &pending {
        resolved_markets.insert(alert.market_id.clone());

        match settle_alert_row(pool, alert, &mut markets).await {
            Ok(true) => {
                report.alerts_settled += 1;
                wallets.insert(alert.wallet_address.clone());
            }
            Ok(false) => report.alerts_skipped += 1,
            Err(e) => {
                tracing::error!(error = %e, alert_id = %alert.id, "Alert settlement failed");
                report.alerts_skipped += 1;
            }
        }
    }

    for market_id in &resolved_markets {
        report.positions_resolved +=
            position_repo::mark_resolved_for_market(pool, market_id).await?;
    }

    let wallets: Vec<String> = wallets.into_iter().collect();
    wallet_stats::refresh_wallets(pool, rules, &wallets).await;

    tracing::info!(
        markets = report.markets_refreshed,
        settled = report.alerts_settled,
        skipped = report.alerts_skipped,
        positions = report.positions_resolved,
        "Resolution pass complete"
    );

    Ok(report)
}

use std::time::Instant;

use chrono::Duration;
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::DetectionConfig;
use crate::db::{alert_repo, market_repo, trade_repo, wallet_repo};
use crate::intelligence::classifier::{self, FreshnessRules, WalletHistory};
use crate::intelligence::scorer::{self, RiskFactors, BURST_WINDOW_HOURS};
use crate::models::{Alert, AlertStatus, Market, NewAlert, Trade, TransitionError};

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

/// Outcome of scoring one trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskAssessment {
    /// Wallet is not fresh; scoring is skipped entirely.
    Exempt,
    Scored(RiskFactors),
}

impl RiskAssessment {
    pub fn total_score(&self) -> i32 {
        match self {
            RiskAssessment::Exempt => 0,
            RiskAssessment::Scored(factors) => factors.total(),
        }
    }

    pub fn factors(&self) -> Option<&RiskFactors> {
        match self {
            RiskAssessment::Exempt => None,
            RiskAssessment::Scored(factors) => Some(factors),
        }
    }
}

/// Gate on freshness, then score. `history` must be the wallet's state at the
/// trade's timestamp; `recent_trade_count` the wallet's trades in the trailing
/// burst window ending there.
pub fn assess_trade(
    trade: &Trade,
    market: &Market,
    history: &WalletHistory,
    recent_trade_count: i64,
    rules: &FreshnessRules,
) -> RiskAssessment {
    if !classifier::evaluate_freshness(history, trade.traded_at, rules) {
        return RiskAssessment::Exempt;
    }

    RiskAssessment::Scored(scorer::score_trade(
        trade.token_amount,
        trade.price,
        trade.traded_at,
        market,
        recent_trade_count,
    ))
}

/// Gross payout if the position resolves in the trader's favour. Falls back to
/// the cost itself for a non-positive price.
pub fn potential_payout(cost: Decimal, price: Decimal) -> Decimal {
    if price > Decimal::ZERO {
        cost / price
    } else {
        cost
    }
}

/// Build the alert row for a trade whose score crossed the threshold.
pub fn build_alert(trade: &Trade, market: &Market, factors: RiskFactors) -> NewAlert {
    NewAlert {
        wallet_address: trade.wallet_address.clone(),
        market_id: trade.market_id.clone(),
        trade_id: trade.id,
        risk_score: factors.total(),
        risk_factors: factors,
        position_size: trade.token_amount,
        potential_payout: Some(potential_payout(trade.token_amount, trade.price)),
        market_resolution_date: market.resolution_date,
    }
}

// ---------------------------------------------------------------------------
// Single trade
// ---------------------------------------------------------------------------

/// Score one trade and persist an alert if it crosses the threshold.
///
/// Missing wallet or market references are skipped, not errors. Returns
/// `None` when no new alert was created, including when another run already
/// alerted the same trade.
pub async fn analyze_trade(
    pool: &PgPool,
    trade: &Trade,
    config: &DetectionConfig,
) -> anyhow::Result<Option<Alert>> {
    let wallet = wallet_repo::get_wallet(pool, &trade.wallet_address).await?;
    let market = market_repo::get_market(pool, &trade.market_id).await?;

    let (Some(_), Some(market)) = (wallet, market) else {
        tracing::warn!(
            trade_id = %trade.id,
            wallet = %trade.wallet_address,
            market = %trade.market_id,
            "Trade references unknown wallet or market, skipping"
        );
        return Ok(None);
    };

    if market.resolved_before(trade.traded_at) {
        tracing::debug!(
            trade_id = %trade.id,
            market = %market.market_id,
            "Trade placed after market resolution, skipping"
        );
        return Ok(None);
    }

    let rules = FreshnessRules::from(config);
    let history = classifier::load_history(pool, &trade.wallet_address, trade.traded_at).await?;

    // Burst count is only needed for fresh wallets.
    let recent = if classifier::evaluate_freshness(&history, trade.traded_at, &rules) {
        trade_repo::count_trades_in_window(
            pool,
            &trade.wallet_address,
            trade.traded_at,
            Duration::hours(BURST_WINDOW_HOURS),
        )
        .await?
    } else {
        0
    };

    let assessment = assess_trade(trade, &market, &history, recent, &rules);
    counter!("trades_scored_total").increment(1);

    let RiskAssessment::Scored(factors) = assessment else {
        tracing::debug!(
            trade_id = %trade.id,
            wallet = %trade.wallet_address,
            "Wallet not fresh, exempt from scoring"
        );
        return Ok(None);
    };

    let score = factors.total();
    if score < config.suspicious_threshold {
        tracing::debug!(trade_id = %trade.id, score, "Below threshold");
        return Ok(None);
    }

    let new_alert = build_alert(trade, &market, factors);
    let Some(alert) = alert_repo::insert_alert(pool, &new_alert).await? else {
        tracing::debug!(trade_id = %trade.id, "Trade already alerted");
        return Ok(None);
    };

    counter!("alerts_created_total").increment(1);
    tracing::warn!(
        alert_id = %alert.id,
        wallet = %trade.wallet_address,
        market = %market.market_id,
        title = %market.title,
        score,
        position = %trade.token_amount,
        price = %trade.price,
        ?factors,
        "Suspicious trade flagged"
    );

    Ok(Some(alert))
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub scanned: usize,
    pub already_alerted: usize,
    pub alerts_created: usize,
    pub failed: usize,
}

/// Run [`analyze_trade`] over a batch. Trades that already carry an alert are
/// skipped; one trade failing never stops the rest. Every trade that was
/// analyzed or skipped is marked scored; failed trades stay unscored and are
/// retried by the next pass.
pub async fn analyze_batch(
    pool: &PgPool,
    trades: &[Trade],
    config: &DetectionConfig,
) -> BatchReport {
    let mut report = BatchReport::default();

    for trade in trades {
        report.scanned += 1;

        match alert_repo::alert_exists_for_trade(pool, trade.id).await {
            Ok(true) => report.already_alerted += 1,
            Ok(false) => match analyze_trade(pool, trade, config).await {
                Ok(Some(_)) => report.alerts_created += 1,
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(error = %e, trade_id = %trade.id, "Trade analysis failed");
                    report.failed += 1;
                    continue;
                }
            },
            Err(e) => {
                tracing::error!(error = %e, trade_id = %trade.id, "Alert lookup failed");
                report.failed += 1;
                continue;
            }
        }

        if let Err(e) = trade_repo::mark_scored(pool, trade.id).await {
            tracing::warn!(error = %e, trade_id = %trade.id, "Could not mark trade scored");
        }
    }

    report
}

/// Analyze up to `limit` trades the detector has not scored yet, oldest
/// first. Progress lives in the store, so downtime of any length is caught up.
pub async fn analyze_unscored_trades(
    pool: &PgPool,
    config: &DetectionConfig,
    limit: i64,
) -> anyhow::Result<BatchReport> {
    let start = Instant::now();
    let trades = trade_repo::get_unscored(pool, limit).await?;

    let report = analyze_batch(pool, &trades, config).await;

    histogram!("detection_pass_seconds").record(start.elapsed().as_secs_f64());
    tracing::info!(
        scanned = report.scanned,
        alerts = report.alerts_created,
        failed = report.failed,
        "Detection pass complete"
    );

    Ok(report)
}

// ---------------------------------------------------------------------------
// Lifecycle actions
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum AlertActionError {
    #[error("alert {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Operator dismissal. Dismissing an already dismissed alert returns it
/// unchanged; won or lost alerts cannot be dismissed.
pub async fn dismiss_alert(pool: &PgPool, id: Uuid) -> Result<Alert, AlertActionError> {
    let alert = alert_repo::get_alert(pool, id)
        .await?
        .ok_or(AlertActionError::NotFound(id))?;

    let current = alert
        .status()
        .ok_or_else(|| anyhow::anyhow!("alert {id} has unknown status {}", alert.status))?;
    let next = current.dismiss()?;

    if next == current {
        return Ok(alert);
    }

    match alert_repo::transition_from_pending(pool, id, next, None).await? {
        Some(updated) => {
            tracing::info!(alert_id = %id, "Alert dismissed");
            Ok(updated)
        }
        // Lost a race with another writer; re-read and judge the new state.
        None => {
            let latest = alert_repo::get_alert(pool, id)
                .await?
                .ok_or(AlertActionError::NotFound(id))?;
            match latest.status() {
                Some(AlertStatus::Dismissed) => Ok(latest),
                Some(from) => Err(TransitionError {
                    from,
                    to: AlertStatus::Dismissed,
                }
                .into()),
                None => Err(anyhow::anyhow!("alert {id} has unknown status {}", latest.status).into()),
            }
        }
    }
}

/// Apply a market outcome to a pending alert.
pub async fn settle_alert(
    pool: &PgPool,
    id: Uuid,
    won: bool,
    actual_return: Decimal,
) -> Result<Alert, AlertActionError> {
    let alert = alert_repo::get_alert(pool, id)
        .await?
        .ok_or(AlertActionError::NotFound(id))?;

    let current = alert
        .status()
        .ok_or_else(|| anyhow::anyhow!("alert {id} has unknown status {}", alert.status))?;
    let next = current.settle(won)?;

    let updated = alert_repo::transition_from_pending(pool, id, next, Some(actual_return))
        .await?
        .ok_or(TransitionError {
            from: AlertStatus::Pending,
            to: next,
        })?;

    counter!("alerts_settled_total").increment(1);
    tracing::info!(alert_id = %id, status = %next, actual_return = %actual_return, "Alert settled");

    Ok(updated)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};

use crate::config::DetectionConfig;
use crate::db::{trade_repo, wallet_repo};
use crate::intelligence::settlement;
use crate::models::{Wallet, WalletStats};

/// Thresholds a wallet must stay under to count as fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessRules {
    pub max_age_days: i64,
    pub max_trades: i64,
    pub max_position: Decimal,
}

impl Default for FreshnessRules {
    fn default() -> Self {
        Self {
            max_age_days: 30,
            max_trades: 20,
            max_position: Decimal::from(10_000),
        }
    }
}

impl From<&DetectionConfig> for FreshnessRules {
    fn from(cfg: &DetectionConfig) -> Self {
        Self {
            max_age_days: cfg.fresh_wallet_days,
            max_trades: cfg.fresh_wallet_max_txs,
            max_position: cfg.fresh_wallet_max_position,
        }
    }
}

/// What a wallet looked like at a point in time: its first-seen date and the
/// trades it made strictly before that instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletHistory {
    /// `None` for an address the store has never seen.
    pub first_seen: Option<DateTime<Utc>>,
    pub prior_trades: i64,
    pub max_prior_amount: Decimal,
}

impl WalletHistory {
    pub fn unknown() -> Self {
        Self {
            first_seen: None,
            prior_trades: 0,
            max_prior_amount: Decimal::ZERO,
        }
    }
}

/// Freshness rule. Unknown wallets are fresh; known wallets must be young,
/// low-activity and have no large prior position, all at once.
///
/// Every input is monotonic in `at` (age grows, prior count and prior max never
/// shrink), so once a wallet evaluates non-fresh it stays non-fresh.
pub fn evaluate_freshness(history: &WalletHistory, at: DateTime<Utc>, rules: &FreshnessRules) -> bool {
    let Some(first_seen) = history.first_seen else {
        return true;
    };

    // An age limit too large to represent never expires.
    let is_new = Duration::try_days(rules.max_age_days)
        .map_or(true, |max_age| at - first_seen < max_age);
    let is_low_activity = history.prior_trades < rules.max_trades;
    let is_small_history = history.max_prior_amount < rules.max_position;

    is_new && is_low_activity && is_small_history
}

/// Load a wallet's point-in-time history from the store.
pub async fn load_history(
    pool: &PgPool,
    address: &str,
    at: DateTime<Utc>,
) -> anyhow::Result<WalletHistory> {
    let Some(wallet) = wallet_repo::get_wallet(pool, address).await? else {
        return Ok(WalletHistory::unknown());
    };

    let summary = trade_repo::summarize_before(pool, address, at).await?;

    Ok(WalletHistory {
        first_seen: Some(wallet.first_seen_date),
        prior_trades: summary.trade_count,
        max_prior_amount: summary.max_amount.unwrap_or(Decimal::ZERO),
    })
}

/// Is `address` fresh as of `at`?
pub async fn is_fresh(
    pool: &PgPool,
    rules: &FreshnessRules,
    address: &str,
    at: DateTime<Utc>,
) -> anyhow::Result<bool> {
    let history = load_history(pool, address, at).await?;
    Ok(evaluate_freshness(&history, at, rules))
}

/// Record activity for a wallet, creating it on first sight.
pub async fn create_or_touch<'e>(
    executor: impl PgExecutor<'e>,
    address: &str,
    activity_at: DateTime<Utc>,
) -> anyhow::Result<Wallet> {
    wallet_repo::upsert_wallet(executor, address, activity_at).await
}

/// Recount trades, resum volume and realized P&L, refresh last activity and
/// re-evaluate freshness as of now. The stored flag only ever moves from fresh
/// to not fresh. Idempotent.
pub async fn recompute_stats(
    pool: &PgPool,
    rules: &FreshnessRules,
    address: &str,
) -> anyhow::Result<WalletStats> {
    let Some(wallet) = wallet_repo::get_wallet(pool, address).await? else {
        return Ok(WalletStats::empty());
    };

    let now = Utc::now();
    let totals = trade_repo::summarize_wallet(pool, address).await?;

    let history = WalletHistory {
        first_seen: Some(wallet.first_seen_date),
        prior_trades: totals.trade_count,
        max_prior_amount: totals.max_amount.unwrap_or(Decimal::ZERO),
    };
    let is_fresh = wallet.is_fresh && evaluate_freshness(&history, now, rules);

    let settled = trade_repo::get_settled_trades_for_wallet(pool, address).await?;
    let lifetime_pnl: Decimal = settled
        .iter()
        .filter_map(settlement::realized_pnl)
        .sum();

    let last_activity = totals.last_trade_at.or(wallet.last_activity_date);
    let total_trades = i32::try_from(totals.trade_count).unwrap_or(i32::MAX);

    let updated = wallet_repo::update_wallet_stats(
        pool,
        address,
        total_trades,
        totals.total_volume.unwrap_or(Decimal::ZERO),
        lifetime_pnl,
        last_activity,
        is_fresh,
    )
    .await?;

    if wallet.is_fresh && !is_fresh {
        tracing::info!(wallet = %address, trades = total_trades, "Wallet no longer fresh");
    }

    Ok(WalletStats::from_wallet(&updated, now))
}

/// Current stored stats, or the empty record for an unknown address.
pub async fn wallet_stats(pool: &PgPool, address: &str) -> anyhow::Result<WalletStats> {
    let stats = wallet_repo::get_wallet(pool, address)
        .await?
        .map(|w| WalletStats::from_wallet(&w, Utc::now()))
        .unwrap_or_else(WalletStats::empty);
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn history(days_old: i64, trades: i64, max_amount: Decimal, now: DateTime<Utc>) -> WalletHistory {
        WalletHistory {
            first_seen: Some(now - Duration::days(days_old)),
            prior_trades: trades,
            max_prior_amount: max_amount,
        }
    }

    #[test]
    fn test_unknown_wallet_is_fresh() {
        let rules = FreshnessRules::default();
        assert!(evaluate_freshness(&WalletHistory::unknown(), Utc::now(), &rules));
    }

    #[test]
    fn test_young_quiet_wallet_is_fresh() {
        let now = Utc::now();
        let rules = FreshnessRules::default();
        assert!(evaluate_freshness(&history(5, 2, dec!(500), now), now, &rules));
    }

    #[test]
    fn test_unrepresentable_age_limit_never_expires() {
        let now = Utc::now();
        let rules = FreshnessRules {
            max_age_days: i64::MAX,
            ..FreshnessRules::default()
        };
        assert!(evaluate_freshness(&history(3650, 2, dec!(500), now), now, &rules));

        // The other conditions still apply.
        assert!(!evaluate_freshness(&history(3650, 25, dec!(500), now), now, &rules));
    }

    #[test]
    fn test_each_condition_can_fail_alone() {
        let now = Utc::now();
        let rules = FreshnessRules::default();

        // Too old
        assert!(!evaluate_freshness(&history(30, 2, dec!(500), now), now, &rules));
        // Too many trades
        assert!(!evaluate_freshness(&history(5, 20, dec!(500), now), now, &rules));
        assert!(!evaluate_freshness(&history(5, 25, dec!(500), now), now, &rules));
        // Large prior position
        assert!(!evaluate_freshness(&history(5, 2, dec!(10000), now), now, &rules));
    }

    #[test]
    fn test_just_under_thresholds_is_fresh() {
        let now = Utc::now();
        let rules = FreshnessRules::default();
        let h = WalletHistory {
            first_seen: Some(now - Duration::days(30) + Duration::seconds(1)),
            prior_trades: 19,
            max_prior_amount: dec!(9999.99),
        };
        assert!(evaluate_freshness(&h, now, &rules));
    }

    #[test]
    fn test_custom_rules() {
        let now = Utc::now();
        let rules = FreshnessRules {
            max_age_days: 7,
            max_trades: 5,
            max_position: dec!(1000),
        };
        assert!(evaluate_freshness(&history(3, 4, dec!(999), now), now, &rules));
        assert!(!evaluate_freshness(&history(8, 4, dec!(999), now), now, &rules));
    }

    #[test]
    fn test_freshness_is_a_one_way_latch() {
        // Replay a wallet's life: history only accumulates as time moves on.
        let rules = FreshnessRules::default();
        let first_seen = Utc::now() - Duration::days(60);
        let amounts = [dec!(100), dec!(250), dec!(12000), dec!(50), dec!(75)];

        let mut prior_trades = 0;
        let mut max_prior = Decimal::ZERO;
        let mut was_non_fresh = false;

        for day in 0..60 {
            let at = first_seen + Duration::days(day);
            let h = WalletHistory {
                first_seen: Some(first_seen),
                prior_trades,
                max_prior_amount: max_prior,
            };
            let fresh = evaluate_freshness(&h, at, &rules);
            if was_non_fresh {
                assert!(!fresh, "freshness re-armed on day {day}");
            }
            was_non_fresh |= !fresh;

            let amount = amounts[(day as usize) % amounts.len()];
            prior_trades += 1;
            max_prior = max_prior.max(amount);
        }

        assert!(was_non_fresh);
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Market;

/// Categories that mark a market as topically niche.
pub const NICHE_CATEGORIES: [&str; 4] = [
    "politics-international",
    "business",
    "legal",
    "geopolitics",
];

/// Trades by one wallet inside the trailing window needed to count as a burst.
pub const BURST_MIN_TRADES: i64 = 3;
pub const BURST_WINDOW_HOURS: i64 = 24;

/// Per-factor breakdown of a trade's risk score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactors {
    pub position_size: i32,
    pub market_niche: i32,
    pub payout_ratio: i32,
    pub time_to_resolution: i32,
    pub burst_trading: i32,
}

impl RiskFactors {
    pub fn total(&self) -> i32 {
        self.position_size
            + self.market_niche
            + self.payout_ratio
            + self.time_to_resolution
            + self.burst_trading
    }
}

/// Score all five factors for one trade.
pub fn score_trade(
    amount: Decimal,
    price: Decimal,
    traded_at: DateTime<Utc>,
    market: &Market,
    recent_trade_count: i64,
) -> RiskFactors {
    RiskFactors {
        position_size: score_position_size(amount),
        market_niche: score_market_niche(market),
        payout_ratio: score_payout_ratio(price),
        time_to_resolution: score_time_to_resolution(market, traded_at),
        burst_trading: score_burst_trading(recent_trade_count),
    }
}

// ---------------------------------------------------------------------------
// Factor 1: Position size (0, 4, 6, 8, 10)
// ---------------------------------------------------------------------------

pub fn score_position_size(amount: Decimal) -> i32 {
    if amount >= Decimal::from(50_000) {
        10
    } else if amount >= Decimal::from(20_000) {
        8
    } else if amount >= Decimal::from(10_000) {
        6
    } else if amount >= Decimal::from(5_000) {
        4
    } else {
        0
    }
}

// ---------------------------------------------------------------------------
// Factor 2: Market niche (0..=7)
// ---------------------------------------------------------------------------

/// Low volume (+3), niche category (+2), few holders (+2). Unknown volume or
/// holder count contributes nothing.
pub fn score_market_niche(market: &Market) -> i32 {
    let mut score = 0;

    if market.total_volume.is_some_and(|v| v < Decimal::from(50_000)) {
        score += 3;
    }

    if market
        .category
        .as_deref()
        .is_some_and(|c| NICHE_CATEGORIES.contains(&c.to_lowercase().as_str()))
    {
        score += 2;
    }

    if market.holder_count.is_some_and(|h| h < 100) {
        score += 2;
    }

    score
}

// ---------------------------------------------------------------------------
// Factor 3: Payout ratio (0, 3, 5, 8)
// ---------------------------------------------------------------------------

/// Cheap long-odds shares score highest. A non-positive price scores 0.
pub fn score_payout_ratio(price: Decimal) -> i32 {
    if price <= Decimal::ZERO {
        return 0;
    }

    if price < Decimal::new(25, 2) {
        8
    } else if price < Decimal::new(35, 2) {
        5
    } else if price < Decimal::new(50, 2) {
        3
    } else {
        0
    }
}

// ---------------------------------------------------------------------------
// Factor 4: Time to resolution (0, 3, 5, 7, 10)
// ---------------------------------------------------------------------------

/// Whole days from `traded_at` to the resolution date, floored. Negative when
/// the trade lands after the scheduled resolution.
pub fn days_until_resolution(resolution: DateTime<Utc>, traded_at: DateTime<Utc>) -> i64 {
    (resolution - traded_at).num_seconds().div_euclid(86_400)
}

pub fn score_time_to_resolution(market: &Market, traded_at: DateTime<Utc>) -> i32 {
    let Some(resolution) = market.resolution_date else {
        return 0;
    };

    match days_until_resolution(resolution, traded_at) {
        d if d <= 1 => 10,
        d if d <= 3 => 7,
        d if d <= 5 => 5,
        d if d <= 7 => 3,
        _ => 0,
    }
}

// ---------------------------------------------------------------------------
// Factor 5: Burst trading (0, 5)
// ---------------------------------------------------------------------------

pub fn score_burst_trading(recent_trade_count: i64) -> i32 {
    if recent_trade_count >= BURST_MIN_TRADES {
        5
    } else {
        0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn make_market(
        category: Option<&str>,
        total_volume: Option<Decimal>,
        holder_count: Option<i32>,
        resolution_date: Option<DateTime<Utc>>,
    ) -> Market {
        Market {
            market_id: "test-market".into(),
            title: "Test Market".into(),
            description: None,
            category: category.map(String::from),
            end_date: None,
            resolution_date,
            resolved: false,
            outcome: None,
            total_volume,
            holder_count,
            metadata: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_position_size_breakpoints() {
        assert_eq!(score_position_size(dec!(60000)), 10);
        assert_eq!(score_position_size(dec!(50000)), 10);
        assert_eq!(score_position_size(dec!(49999.99)), 8);
        assert_eq!(score_position_size(dec!(25000)), 8);
        assert_eq!(score_position_size(dec!(20000)), 8);
        assert_eq!(score_position_size(dec!(15000)), 6);
        assert_eq!(score_position_size(dec!(10000)), 6);
        assert_eq!(score_position_size(dec!(7000)), 4);
        assert_eq!(score_position_size(dec!(5000)), 4);
        assert_eq!(score_position_size(dec!(3000)), 0);
    }

    #[test]
    fn test_position_size_zero_below_5000_and_monotonic() {
        let mut prev = score_position_size(Decimal::ZERO);
        assert_eq!(prev, 0);
        for step in 1..=700 {
            let amount = Decimal::from(step * 100);
            let score = score_position_size(amount);
            if amount < dec!(5000) {
                assert_eq!(score, 0, "amount {amount} should score 0");
            }
            assert!(score >= prev, "score dropped at {amount}");
            prev = score;
        }
    }

    #[test]
    fn test_payout_ratio_buckets() {
        assert_eq!(score_payout_ratio(dec!(0.20)), 8);
        assert_eq!(score_payout_ratio(dec!(0.30)), 5);
        assert_eq!(score_payout_ratio(dec!(0.45)), 3);
        assert_eq!(score_payout_ratio(dec!(0.60)), 0);
        assert_eq!(score_payout_ratio(dec!(0.25)), 5);
        assert_eq!(score_payout_ratio(dec!(0.35)), 3);
        assert_eq!(score_payout_ratio(dec!(0.50)), 0);
    }

    #[test]
    fn test_payout_ratio_degenerate_price() {
        assert_eq!(score_payout_ratio(Decimal::ZERO), 0);
        assert_eq!(score_payout_ratio(dec!(-0.1)), 0);
    }

    #[test]
    fn test_payout_ratio_non_increasing_in_price() {
        let mut prev = i32::MAX;
        for cents in 1..=100 {
            let score = score_payout_ratio(Decimal::new(cents, 2));
            assert!(score <= prev, "score rose at price 0.{cents:02}");
            prev = score;
        }
    }

    #[test]
    fn test_market_niche_full_score() {
        let market = make_market(
            Some("politics-international"),
            Some(dec!(30000)),
            Some(50),
            None,
        );
        assert_eq!(score_market_niche(&market), 7);
    }

    #[test]
    fn test_market_niche_category_case_insensitive() {
        let market = make_market(Some("Geopolitics"), None, None, None);
        assert_eq!(score_market_niche(&market), 2);
        let market = make_market(Some("sports"), None, None, None);
        assert_eq!(score_market_niche(&market), 0);
    }

    #[test]
    fn test_market_niche_all_unknown_scores_zero() {
        let market = make_market(None, None, None, None);
        assert_eq!(score_market_niche(&market), 0);
    }

    #[test]
    fn test_market_niche_large_market() {
        let market = make_market(Some("crypto"), Some(dec!(2000000)), Some(5000), None);
        assert_eq!(score_market_niche(&market), 0);
    }

    #[test]
    fn test_time_to_resolution_buckets() {
        let now = Utc::now();
        let cases = [(1, 10), (2, 7), (3, 7), (4, 5), (5, 5), (6, 3), (7, 3), (8, 0), (30, 0)];
        for (days, expected) in cases {
            let market = make_market(None, None, None, Some(now + Duration::days(days)));
            assert_eq!(
                score_time_to_resolution(&market, now),
                expected,
                "{days} days out"
            );
        }
    }

    #[test]
    fn test_time_to_resolution_past_is_maximal() {
        let now = Utc::now();
        let market = make_market(None, None, None, Some(now - Duration::hours(6)));
        assert_eq!(score_time_to_resolution(&market, now), 10);
    }

    #[test]
    fn test_time_to_resolution_missing_date() {
        let market = make_market(None, None, None, None);
        assert_eq!(score_time_to_resolution(&market, Utc::now()), 0);
    }

    #[test]
    fn test_time_to_resolution_non_increasing() {
        let now = Utc::now();
        let mut prev = i32::MAX;
        for hours in (-48..=24 * 14).step_by(6) {
            let market = make_market(None, None, None, Some(now + Duration::hours(hours)));
            let score = score_time_to_resolution(&market, now);
            assert!(score <= prev, "score rose at +{hours}h");
            prev = score;
        }
    }

    #[test]
    fn test_days_until_resolution_floors() {
        let now = Utc::now();
        assert_eq!(days_until_resolution(now + Duration::hours(47), now), 1);
        assert_eq!(days_until_resolution(now - Duration::hours(1), now), -1);
        assert_eq!(days_until_resolution(now, now), 0);
    }

    #[test]
    fn test_burst_trading() {
        assert_eq!(score_burst_trading(0), 0);
        assert_eq!(score_burst_trading(2), 0);
        assert_eq!(score_burst_trading(3), 5);
        assert_eq!(score_burst_trading(12), 5);
    }

    #[test]
    fn test_score_trade_sums_components() {
        let now = Utc::now();
        let market = make_market(
            Some("politics-international"),
            Some(dec!(30000)),
            None,
            Some(now + Duration::days(2)),
        );

        let factors = score_trade(dec!(60000), dec!(0.18), now, &market, 1);

        assert_eq!(
            factors,
            RiskFactors {
                position_size: 10,
                market_niche: 5,
                payout_ratio: 8,
                time_to_resolution: 7,
                burst_trading: 0,
            }
        );
        assert_eq!(factors.total(), 30);
    }

    #[test]
    fn test_risk_factors_serialize_all_keys() {
        let json = serde_json::to_value(RiskFactors::default()).unwrap();
        for key in [
            "position_size",
            "market_niche",
            "payout_ratio",
            "time_to_resolution",
            "burst_trading",
        ] {
            assert_eq!(json[key], 0, "missing key {key}");
        }
    }
}

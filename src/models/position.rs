use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Side;

/// Database row for the positions table. One row per (wallet, market).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Position {
    pub id: Uuid,
    pub wallet_address: String,
    pub market_id: String,
    pub shares: Decimal,
    pub avg_purchase_price: Decimal,
    pub total_invested: Decimal,
    pub current_value: Option<Decimal>,
    pub unrealized_pnl: Option<Decimal>,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Open,
    Closed,
    Resolved,
}

impl PositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Open => "open",
            PositionStatus::Closed => "closed",
            PositionStatus::Resolved => "resolved",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "open" => Some(PositionStatus::Open),
            "closed" => Some(PositionStatus::Closed),
            "resolved" => Some(PositionStatus::Resolved),
            _ => None,
        }
    }
}

/// Running share/cost aggregate for a wallet in one market.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionState {
    pub shares: Decimal,
    pub avg_purchase_price: Decimal,
    pub total_invested: Decimal,
    pub status: PositionStatus,
}

impl Default for PositionState {
    fn default() -> Self {
        Self {
            shares: Decimal::ZERO,
            avg_purchase_price: Decimal::ZERO,
            total_invested: Decimal::ZERO,
            status: PositionStatus::Open,
        }
    }
}

impl From<&Position> for PositionState {
    fn from(p: &Position) -> Self {
        Self {
            shares: p.shares,
            avg_purchase_price: p.avg_purchase_price,
            total_invested: p.total_invested,
            status: PositionStatus::from_str(&p.status).unwrap_or(PositionStatus::Open),
        }
    }
}

impl PositionState {
    /// Fold one fill into the aggregate.
    ///
    /// Buys add shares at a weighted average price. Sells remove shares (never
    /// below zero) and release invested cost at the average price. A resolved
    /// position is frozen.
    pub fn apply(self, side: Side, shares: Decimal, price: Decimal) -> Self {
        if self.status == PositionStatus::Resolved || shares <= Decimal::ZERO {
            return self;
        }

        match side {
            Side::Buy => {
                let new_shares = self.shares + shares;
                let new_invested = self.total_invested + shares * price;
                let new_avg = if new_shares.is_zero() {
                    Decimal::ZERO
                } else {
                    (self.avg_purchase_price * self.shares + price * shares) / new_shares
                };
                Self {
                    shares: new_shares,
                    avg_purchase_price: new_avg,
                    total_invested: new_invested,
                    status: PositionStatus::Open,
                }
            }
            Side::Sell => {
                let sold = shares.min(self.shares);
                let remaining = self.shares - sold;
                if remaining.is_zero() {
                    return Self {
                        shares: Decimal::ZERO,
                        avg_purchase_price: self.avg_purchase_price,
                        total_invested: Decimal::ZERO,
                        status: PositionStatus::Closed,
                    };
                }
                Self {
                    shares: remaining,
                    avg_purchase_price: self.avg_purchase_price,
                    total_invested: (self.total_invested - sold * self.avg_purchase_price)
                        .max(Decimal::ZERO),
                    status: PositionStatus::Open,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_buys_average_price() {
        let pos = PositionState::default()
            .apply(Side::Buy, dec!(100), dec!(0.20))
            .apply(Side::Buy, dec!(100), dec!(0.40));

        assert_eq!(pos.shares, dec!(200));
        assert_eq!(pos.avg_purchase_price, dec!(0.30));
        assert_eq!(pos.total_invested, dec!(60));
        assert_eq!(pos.status, PositionStatus::Open);
    }

    #[test]
    fn test_partial_sell_keeps_average() {
        let pos = PositionState::default()
            .apply(Side::Buy, dec!(100), dec!(0.50))
            .apply(Side::Sell, dec!(40), dec!(0.70));

        assert_eq!(pos.shares, dec!(60));
        assert_eq!(pos.avg_purchase_price, dec!(0.50));
        assert_eq!(pos.total_invested, dec!(30));
        assert_eq!(pos.status, PositionStatus::Open);
    }

    #[test]
    fn test_full_sell_closes() {
        let pos = PositionState::default()
            .apply(Side::Buy, dec!(10), dec!(0.50))
            .apply(Side::Sell, dec!(25), dec!(0.60));

        assert_eq!(pos.shares, Decimal::ZERO);
        assert_eq!(pos.total_invested, Decimal::ZERO);
        assert_eq!(pos.status, PositionStatus::Closed);
    }

    #[test]
    fn test_buy_reopens_closed_position() {
        let pos = PositionState {
            status: PositionStatus::Closed,
            ..PositionState::default()
        }
        .apply(Side::Buy, dec!(5), dec!(0.10));

        assert_eq!(pos.status, PositionStatus::Open);
        assert_eq!(pos.shares, dec!(5));
    }

    #[test]
    fn test_resolved_position_is_frozen() {
        let resolved = PositionState {
            shares: dec!(10),
            avg_purchase_price: dec!(0.3),
            total_invested: dec!(3),
            status: PositionStatus::Resolved,
        };
        assert_eq!(resolved.apply(Side::Buy, dec!(5), dec!(0.5)), resolved);
    }
}

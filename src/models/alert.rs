use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use crate::intelligence::scorer::RiskFactors;

/// Database row for the alerts table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Alert {
    pub id: Uuid,
    pub wallet_address: String,
    pub market_id: String,
    pub trade_id: Option<Uuid>,
    pub risk_score: i32,
    pub risk_factors: Json<RiskFactors>,
    pub position_size: Decimal,
    pub potential_payout: Option<Decimal>,
    pub market_resolution_date: Option<DateTime<Utc>>,
    pub status: String,
    pub actual_return: Option<Decimal>,
    pub flagged_at: DateTime<Utc>,
}

impl Alert {
    pub fn status(&self) -> Option<AlertStatus> {
        AlertStatus::from_str(&self.status)
    }
}

/// Insert payload for a freshly flagged trade.
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub wallet_address: String,
    pub market_id: String,
    pub trade_id: Uuid,
    pub risk_score: i32,
    pub risk_factors: RiskFactors,
    pub position_size: Decimal,
    pub potential_payout: Option<Decimal>,
    pub market_resolution_date: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Alert review state. `Dismissed`, `Won` and `Lost` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Pending,
    Dismissed,
    Won,
    Lost,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("alert cannot move from {from} to {to}")]
pub struct TransitionError {
    pub from: AlertStatus,
    pub to: AlertStatus,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Pending => "pending",
            AlertStatus::Dismissed => "dismissed",
            AlertStatus::Won => "won",
            AlertStatus::Lost => "lost",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(AlertStatus::Pending),
            "dismissed" => Some(AlertStatus::Dismissed),
            "won" => Some(AlertStatus::Won),
            "lost" => Some(AlertStatus::Lost),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AlertStatus::Pending)
    }

    /// Operator dismissal. Dismissing twice is a no-op.
    pub fn dismiss(self) -> Result<AlertStatus, TransitionError> {
        match self {
            AlertStatus::Pending | AlertStatus::Dismissed => Ok(AlertStatus::Dismissed),
            from => Err(TransitionError {
                from,
                to: AlertStatus::Dismissed,
            }),
        }
    }

    /// Apply the market outcome to a pending alert.
    pub fn settle(self, won: bool) -> Result<AlertStatus, TransitionError> {
        let to = if won { AlertStatus::Won } else { AlertStatus::Lost };
        if self.is_terminal() {
            return Err(TransitionError { from: self, to });
        }
        Ok(to)
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dismiss_pending() {
        assert_eq!(AlertStatus::Pending.dismiss(), Ok(AlertStatus::Dismissed));
    }

    #[test]
    fn test_dismiss_is_idempotent() {
        let once = AlertStatus::Pending.dismiss().unwrap();
        let twice = once.dismiss().unwrap();
        assert_eq!(twice, AlertStatus::Dismissed);
    }

    #[test]
    fn test_dismiss_settled_alert_rejected() {
        let err = AlertStatus::Won.dismiss().unwrap_err();
        assert_eq!(err.from, AlertStatus::Won);
        assert_eq!(err.to, AlertStatus::Dismissed);
        assert!(AlertStatus::Lost.dismiss().is_err());
    }

    #[test]
    fn test_settle_only_from_pending() {
        assert_eq!(AlertStatus::Pending.settle(true), Ok(AlertStatus::Won));
        assert_eq!(AlertStatus::Pending.settle(false), Ok(AlertStatus::Lost));
        assert!(AlertStatus::Dismissed.settle(true).is_err());
        assert!(AlertStatus::Won.settle(false).is_err());
        assert!(AlertStatus::Lost.settle(true).is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!AlertStatus::Pending.is_terminal());
        assert!(AlertStatus::Dismissed.is_terminal());
        assert!(AlertStatus::Won.is_terminal());
        assert!(AlertStatus::Lost.is_terminal());
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for s in [
            AlertStatus::Pending,
            AlertStatus::Dismissed,
            AlertStatus::Won,
            AlertStatus::Lost,
        ] {
            assert_eq!(AlertStatus::from_str(s.as_str()), Some(s));
        }
        assert_eq!(AlertStatus::from_str("PENDING"), Some(AlertStatus::Pending));
        assert_eq!(AlertStatus::from_str("open"), None);
    }
}

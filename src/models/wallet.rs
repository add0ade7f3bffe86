use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database row for the wallets table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Wallet {
    pub address: String,
    pub first_seen_date: DateTime<Utc>,
    pub last_activity_date: Option<DateTime<Utc>>,
    pub total_trades: i32,
    pub total_volume: Decimal,
    pub lifetime_pnl: Decimal,
    pub is_fresh: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read-side summary of a wallet. Unknown addresses get [`WalletStats::empty`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletStats {
    pub exists: bool,
    pub is_fresh: bool,
    pub total_trades: i32,
    pub total_volume: Decimal,
    pub lifetime_pnl: Decimal,
    pub days_active: i64,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
}

impl WalletStats {
    pub fn empty() -> Self {
        Self {
            exists: false,
            is_fresh: true,
            total_trades: 0,
            total_volume: Decimal::ZERO,
            lifetime_pnl: Decimal::ZERO,
            days_active: 0,
            first_seen: None,
            last_activity: None,
        }
    }

    pub fn from_wallet(wallet: &Wallet, now: DateTime<Utc>) -> Self {
        Self {
            exists: true,
            is_fresh: wallet.is_fresh,
            total_trades: wallet.total_trades,
            total_volume: wallet.total_volume,
            lifetime_pnl: wallet.lifetime_pnl,
            days_active: (now - wallet.first_seen_date).num_days(),
            first_seen: Some(wallet.first_seen_date),
            last_activity: wallet.last_activity_date,
        }
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use super::Side;

/// Database row for the trades table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trade {
    pub id: Uuid,
    pub tx_hash: String,
    pub wallet_address: String,
    pub market_id: String,
    pub side: String,
    pub outcome: Option<String>,
    /// Cost basis in USDC.
    pub token_amount: Decimal,
    pub shares: Decimal,
    pub price: Decimal,
    pub traded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Set once the detector has analyzed the trade.
    pub scored_at: Option<DateTime<Utc>>,
}

impl Trade {
    pub fn side(&self) -> Option<Side> {
        Side::from_api_str(&self.side)
    }
}

// ---------------------------------------------------------------------------
// NewTrade: canonical ingestion record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrade {
    pub tx_hash: String,
    pub wallet_address: String,
    pub market_id: String,
    pub side: Side,
    pub outcome: Option<String>,
    pub token_amount: Decimal,
    pub shares: Decimal,
    pub price: Decimal,
    pub traded_at: DateTime<Utc>,
}

impl fmt::Display for NewTrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trade: tx={} wallet={} market={} side={} shares={} price={} amount={}",
            &self.tx_hash[..10.min(self.tx_hash.len())],
            &self.wallet_address[..10.min(self.wallet_address.len())],
            self.market_id,
            self.side,
            self.shares,
            self.price,
            self.token_amount,
        )
    }
}

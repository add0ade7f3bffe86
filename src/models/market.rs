use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// Database row for the markets table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Market {
    pub market_id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub end_date: Option<DateTime<Utc>>,
    pub resolution_date: Option<DateTime<Utc>>,
    pub resolved: bool,
    pub outcome: Option<String>,
    pub total_volume: Option<Decimal>,
    pub holder_count: Option<i32>,
    pub metadata: Option<Json<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Market {
    /// True once the market has resolved at or before `at`. Trades placed after
    /// that point are settlement flow and are not scored.
    pub fn resolved_before(&self, at: DateTime<Utc>) -> bool {
        self.resolved && self.resolution_date.is_some_and(|d| d <= at)
    }
}

/// Canonical market record produced by ingestion, keyed by `market_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMarket {
    pub market_id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub end_date: Option<DateTime<Utc>>,
    pub resolution_date: Option<DateTime<Utc>>,
    pub resolved: bool,
    pub outcome: Option<String>,
    pub total_volume: Option<Decimal>,
    pub holder_count: Option<i32>,
    pub metadata: Option<serde_json::Value>,
}

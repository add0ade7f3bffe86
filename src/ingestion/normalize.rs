use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use crate::models::{NewMarket, NewTrade, Side};
use crate::polymarket::{ApiTrade, GammaMarket};

/// Why an upstream record was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("unknown side: {0}")]
    InvalidSide(String),

    #[error("price {0} outside [0, 1]")]
    PriceOutOfRange(Decimal),

    #[error("negative size {0}")]
    NegativeSize(Decimal),

    #[error("unparseable timestamp")]
    InvalidTimestamp,
}

/// Trim and drop empty strings.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Unix seconds, unix millis (anything above 1e12) or RFC 3339.
pub fn parse_trade_timestamp(ts: &serde_json::Value) -> Option<DateTime<Utc>> {
    fn from_unix(value: i64) -> Option<DateTime<Utc>> {
        if value <= 0 {
            return None;
        }
        if value > 1_000_000_000_000 {
            let nanos = u32::try_from(value.rem_euclid(1000) * 1_000_000).ok()?;
            DateTime::from_timestamp(value.div_euclid(1000), nanos)
        } else {
            DateTime::from_timestamp(value, 0)
        }
    }

    match ts {
        serde_json::Value::Number(n) => from_unix(n.as_i64()?),
        serde_json::Value::String(s) => {
            let s = s.trim();
            if let Ok(value) = s.parse::<i64>() {
                return from_unix(value);
            }
            parse_date(s)
        }
        _ => None,
    }
}

/// RFC 3339, or a bare `YYYY-MM-DD` taken as midnight UTC.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Decimal from a JSON number or numeric string.
fn decimal_from_value(value: Option<&serde_json::Value>) -> Option<Decimal> {
    match value? {
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok())),
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn int_from_value(value: Option<&serde_json::Value>) -> Option<i32> {
    match value? {
        serde_json::Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Trades
// ---------------------------------------------------------------------------

/// Market key carried by a trade: the market slug, else the event slug.
pub fn trade_market_id(trade: &ApiTrade) -> Option<&str> {
    non_empty(trade.slug.as_deref()).or(non_empty(trade.event_slug.as_deref()))
}

impl TryFrom<&ApiTrade> for NewTrade {
    type Error = NormalizeError;

    fn try_from(raw: &ApiTrade) -> Result<Self, Self::Error> {
        let tx_hash = non_empty(raw.transaction_hash.as_deref())
            .ok_or(NormalizeError::MissingField("transactionHash"))?;
        let wallet = non_empty(raw.proxy_wallet.as_deref())
            .ok_or(NormalizeError::MissingField("proxyWallet"))?;
        let market_id = trade_market_id(raw).ok_or(NormalizeError::MissingField("slug"))?;

        let side_raw =
            non_empty(raw.side.as_deref()).ok_or(NormalizeError::MissingField("side"))?;
        let side = Side::from_api_str(side_raw)
            .ok_or_else(|| NormalizeError::InvalidSide(side_raw.into()))?;

        let size = raw.size.ok_or(NormalizeError::MissingField("size"))?;
        let price = raw.price.ok_or(NormalizeError::MissingField("price"))?;
        if size < Decimal::ZERO {
            return Err(NormalizeError::NegativeSize(size));
        }
        if price < Decimal::ZERO || price > Decimal::ONE {
            return Err(NormalizeError::PriceOutOfRange(price));
        }

        let traded_at = raw
            .timestamp
            .as_ref()
            .ok_or(NormalizeError::MissingField("timestamp"))
            .and_then(|ts| parse_trade_timestamp(ts).ok_or(NormalizeError::InvalidTimestamp))?;

        Ok(NewTrade {
            tx_hash: tx_hash.to_string(),
            wallet_address: wallet.to_lowercase(),
            market_id: market_id.to_string(),
            side,
            outcome: non_empty(raw.outcome.as_deref()).map(String::from),
            token_amount: size * price,
            shares: size,
            price,
            traded_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Markets
// ---------------------------------------------------------------------------

impl NewMarket {
    /// Thin market record from the fields embedded in a trade. Volume and
    /// holders stay unknown so the niche score does not treat them as zero.
    pub fn stub_from_trade(raw: &ApiTrade) -> Option<Self> {
        let market_id = trade_market_id(raw)?;
        let title = non_empty(raw.title.as_deref()).unwrap_or(market_id);

        Some(Self {
            market_id: market_id.to_string(),
            title: title.to_string(),
            description: None,
            category: non_empty(raw.category.as_deref()).map(String::from),
            end_date: None,
            resolution_date: None,
            resolved: false,
            outcome: None,
            total_volume: None,
            holder_count: None,
            metadata: Some(serde_json::json!({
                "asset": raw.asset,
                "conditionId": raw.condition_id,
                "eventSlug": raw.event_slug,
                "icon": raw.icon,
            })),
        })
    }
}

/// Winning label of a closed market, read from `outcomePrices`.
fn outcome_from_prices(raw: &GammaMarket) -> Option<String> {
    let labels = raw.outcome_labels();
    let prices = raw.outcome_price_list();

    labels
        .into_iter()
        .zip(prices)
        .find(|(_, price)| Decimal::from_str(price.trim()).is_ok_and(|p| p == Decimal::ONE))
        .map(|(label, _)| label)
}

impl TryFrom<&GammaMarket> for NewMarket {
    type Error = NormalizeError;

    fn try_from(raw: &GammaMarket) -> Result<Self, Self::Error> {
        let market_id = non_empty(raw.slug.as_deref())
            .or(non_empty(raw.condition_id.as_deref()))
            .ok_or(NormalizeError::MissingField("slug"))?;
        let title = non_empty(raw.question.as_deref())
            .or(non_empty(raw.title.as_deref()))
            .ok_or(NormalizeError::MissingField("question"))?;

        let end_date = raw.end_date.as_deref().and_then(parse_date);
        let resolution_date = raw
            .resolution_date
            .as_deref()
            .and_then(parse_date)
            .or(end_date);

        let closed = raw.closed.unwrap_or(false);
        let resolved = closed || raw.resolved.unwrap_or(false);
        let outcome = non_empty(raw.outcome.as_deref())
            .map(String::from)
            .or_else(|| if closed { outcome_from_prices(raw) } else { None });

        let total_volume = decimal_from_value(raw.volume.as_ref())
            .or_else(|| decimal_from_value(raw.liquidity.as_ref()));

        Ok(NewMarket {
            market_id: market_id.to_string(),
            title: title.to_string(),
            description: non_empty(raw.description.as_deref()).map(String::from),
            category: non_empty(raw.category.as_deref()).map(String::from),
            end_date,
            resolution_date,
            resolved,
            outcome,
            total_volume,
            holder_count: int_from_value(raw.participants.as_ref()),
            metadata: serde_json::to_value(raw).ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

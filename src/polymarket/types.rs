use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Trade (Data API, REST)
// ---------------------------------------------------------------------------

/// One fill as returned by `GET /trades`. Every field is optional upstream;
/// `ingestion::normalize` decides what is required.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTrade {
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub proxy_wallet: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub condition_id: Option<String>,
    #[serde(default)]
    pub size: Option<Decimal>,
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Unix seconds, unix millis or RFC 3339 depending on the endpoint.
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub event_slug: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub outcome_index: Option<i32>,
    #[serde(default)]
    pub icon: Option<String>,
}

// ---------------------------------------------------------------------------
// Market (Gamma API)
// ---------------------------------------------------------------------------

/// Market metadata from the Gamma API. Numeric fields arrive as strings on
/// some endpoints and numbers on others, hence `serde_json::Value`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaMarket {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub condition_id: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub resolution_date: Option<String>,
    #[serde(default)]
    pub closed: Option<bool>,
    #[serde(default)]
    pub resolved: Option<bool>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub outcome: Option<String>,
    /// Stringified JSON array of outcome labels, e.g. `["Yes","No"]`.
    #[serde(default)]
    pub outcomes: Option<String>,
    /// Stringified JSON array of prices aligned with `outcomes`.
    #[serde(default)]
    pub outcome_prices: Option<String>,
    #[serde(default)]
    pub volume: Option<serde_json::Value>,
    #[serde(default)]
    pub liquidity: Option<serde_json::Value>,
    #[serde(default)]
    pub participants: Option<serde_json::Value>,
}

impl GammaMarket {
    /// Parse a stringified JSON array field into its labels.
    fn parse_string_array(raw: Option<&str>) -> Vec<String> {
        raw.and_then(|s| serde_json::from_str::<Vec<String>>(s).ok())
            .unwrap_or_default()
    }

    pub fn outcome_labels(&self) -> Vec<String> {
        Self::parse_string_array(self.outcomes.as_deref())
    }

    pub fn outcome_price_list(&self) -> Vec<String> {
        Self::parse_string_array(self.outcome_prices.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_api_trade_deserializes_data_api_shape() {
        let raw = r#"{
            "proxyWallet": "0xabc",
            "side": "BUY",
            "asset": "123",
            "conditionId": "0xcond",
            "size": 1500.5,
            "price": 0.18,
            "timestamp": 1718000000,
            "title": "Will X happen?",
            "slug": "will-x-happen",
            "eventSlug": "x-event",
            "outcome": "Yes",
            "outcomeIndex": 0,
            "transactionHash": "0xhash"
        }"#;

        let trade: ApiTrade = serde_json::from_str(raw).unwrap();
        assert_eq!(trade.proxy_wallet.as_deref(), Some("0xabc"));
        assert_eq!(trade.transaction_hash.as_deref(), Some("0xhash"));
        assert_eq!(trade.event_slug.as_deref(), Some("x-event"));
        assert_eq!(trade.size, Some(dec!(1500.5)));
        assert_eq!(trade.price, Some(dec!(0.18)));
        assert_eq!(trade.timestamp, Some(serde_json::json!(1718000000)));
    }

    #[test]
    fn test_gamma_market_parses_stringified_arrays() {
        let raw = r#"{
            "conditionId": "0xcond",
            "slug": "will-x-happen",
            "question": "Will X happen?",
            "outcomes": "[\"Yes\", \"No\"]",
            "outcomePrices": "[\"1\", \"0\"]",
            "volume": "12345.6",
            "closed": true
        }"#;

        let market: GammaMarket = serde_json::from_str(raw).unwrap();
        assert_eq!(market.outcome_labels(), vec!["Yes", "No"]);
        assert_eq!(market.outcome_price_list(), vec!["1", "0"]);
        assert_eq!(market.closed, Some(true));
    }
}

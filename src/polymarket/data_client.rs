use reqwest::{Client, Url};
use thiserror::Error;

use super::types::ApiTrade;

const DATA_API_BASE: &str = "https://data-api.polymarket.com";

#[derive(Debug, Error)]
pub enum DataClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(String),
}

#[derive(Debug, Clone)]
pub struct DataClient {
    http: Client,
    base_url: String,
}

impl DataClient {
    pub fn new(http: Client) -> Self {
        Self::with_base_url(http, DATA_API_BASE)
    }

    pub fn with_base_url(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the most recent trades across all markets, newest first.
    pub async fn get_recent_trades(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ApiTrade>, DataClientError> {
        let url = Url::parse_with_params(
            &format!("{}/trades", self.base_url),
            &[("limit", limit.to_string()), ("offset", offset.to_string())],
        )
        .map_err(|e| DataClientError::Url(e.to_string()))?;

        let resp = self.http.get(url).send().await?.error_for_status()?;

        let trades: Vec<ApiTrade> = resp.json().await?;
        Ok(trades)
    }
}

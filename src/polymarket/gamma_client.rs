use reqwest::{Client, Url};
use thiserror::Error;

use super::types::GammaMarket;

const GAMMA_API_BASE: &str = "https://gamma-api.polymarket.com";

#[derive(Debug, Error)]
pub enum GammaClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(String),
}

#[derive(Debug, Clone)]
pub struct GammaClient {
    http: Client,
    base_url: String,
}

impl GammaClient {
    pub fn new(http: Client) -> Self {
        Self::with_base_url(http, GAMMA_API_BASE)
    }

    pub fn with_base_url(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn markets_url(&self, params: &[(&str, String)]) -> Result<Url, GammaClientError> {
        Url::parse_with_params(&format!("{}/markets", self.base_url), params)
            .map_err(|e| GammaClientError::Url(e.to_string()))
    }

    /// Fetch a page of markets. `active = None` returns every market.
    pub async fn get_markets(
        &self,
        limit: u32,
        offset: u32,
        active: Option<bool>,
    ) -> Result<Vec<GammaMarket>, GammaClientError> {
        let mut params = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
        if let Some(active) = active {
            params.push(("active", active.to_string()));
        }
        let url = self.markets_url(&params)?;

        let resp = self.http.get(url).send().await?.error_for_status()?;

        let markets: Vec<GammaMarket> = resp.json().await?;
        Ok(markets)
    }

    /// Look up one market by slug. Returns `None` if Gamma does not know it.
    pub async fn get_market_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<GammaMarket>, GammaClientError> {
        let url = self.markets_url(&[("slug", slug.to_string())])?;

        let resp = self.http.get(url).send().await?.error_for_status()?;

        let markets: Vec<GammaMarket> = resp.json().await?;
        Ok(markets.into_iter().next())
    }
}

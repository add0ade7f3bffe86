use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

const DEFAULT_DATA_API: &str = "https://data-api.polymarket.com";
const DEFAULT_GAMMA_API: &str = "https://gamma-api.polymarket.com";

/// Thresholds consumed by the classifier and the alert engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionConfig {
    pub suspicious_threshold: i32,
    pub fresh_wallet_days: i64,
    pub fresh_wallet_max_txs: i64,
    pub fresh_wallet_max_position: Decimal,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            suspicious_threshold: 20,
            fresh_wallet_days: 30,
            fresh_wallet_max_txs: 20,
            fresh_wallet_max_position: Decimal::from(10_000),
        }
    }
}

impl DetectionConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            suspicious_threshold: env_or("SUSPICIOUS_THRESHOLD", defaults.suspicious_threshold),
            fresh_wallet_days: env_or("FRESH_WALLET_DAYS", defaults.fresh_wallet_days),
            fresh_wallet_max_txs: env_or("FRESH_WALLET_MAX_TXS", defaults.fresh_wallet_max_txs),
            fresh_wallet_max_position: env_or(
                "FRESH_WALLET_MAX_POSITION",
                defaults.fresh_wallet_max_position,
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Bearer token for `/api/*`; `None` disables auth.
    pub api_token: Option<String>,

    // Upstream APIs
    pub data_api_url: String,
    pub gamma_api_url: String,

    pub detection: DetectionConfig,

    // Jobs
    pub collector_enabled: bool,
    pub detector_enabled: bool,
    pub resolution_enabled: bool,
    pub collection_interval_secs: u64,
    pub detection_interval_secs: u64,
    pub detection_batch_size: i64,
    pub resolution_interval_secs: u64,
    pub trades_fetch_limit: u32,
    pub markets_fetch_limit: u32,
    pub max_backoff_secs: u64,
}

impl AppConfig {
    /// Defaults for everything but the database.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "0.0.0.0".into(),
            port: 8000,
            api_token: None,
            data_api_url: DEFAULT_DATA_API.into(),
            gamma_api_url: DEFAULT_GAMMA_API.into(),
            detection: DetectionConfig::default(),
            collector_enabled: true,
            detector_enabled: true,
            resolution_enabled: true,
            collection_interval_secs: 300,
            // Offset from the collector so detection sees the freshest pass.
            detection_interval_secs: 330,
            detection_batch_size: 5000,
            resolution_interval_secs: 900,
            trades_fetch_limit: 1000,
            markets_fetch_limit: 200,
            max_backoff_secs: 600,
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let d = Self::new(database_url);

        let collection_interval_secs =
            env_or("COLLECTION_INTERVAL_SECONDS", d.collection_interval_secs);

        Ok(Self {
            host: env::var("HOST").unwrap_or(d.host),
            port: env::var("PORT")
                .unwrap_or_else(|_| d.port.to_string())
                .parse()?,
            api_token: env::var("API_TOKEN").ok().filter(|t| !t.trim().is_empty()),

            data_api_url: env::var("POLYMARKET_DATA_API").unwrap_or(d.data_api_url),
            gamma_api_url: env::var("POLYMARKET_GAMMA_API").unwrap_or(d.gamma_api_url),

            detection: DetectionConfig::from_env(),

            collector_enabled: env_or("COLLECTOR_ENABLED", d.collector_enabled),
            detector_enabled: env_or("DETECTOR_ENABLED", d.detector_enabled),
            resolution_enabled: env_or("RESOLUTION_ENABLED", d.resolution_enabled),
            collection_interval_secs,
            detection_interval_secs: env_or(
                "DETECTION_INTERVAL_SECONDS",
                collection_interval_secs + 30,
            ),
            detection_batch_size: env_or("DETECTION_BATCH_SIZE", d.detection_batch_size).max(1),
            resolution_interval_secs: env_or(
                "RESOLUTION_INTERVAL_SECONDS",
                d.resolution_interval_secs,
            ),
            trades_fetch_limit: env_or("TRADES_FETCH_LIMIT", d.trades_fetch_limit),
            markets_fetch_limit: env_or("MARKETS_FETCH_LIMIT", d.markets_fetch_limit),
            max_backoff_secs: env_or("MAX_BACKOFF_SECONDS", d.max_backoff_secs),
            database_url: d.database_url,
        })
    }
}

/// Parse an env var, falling back to `default` when unset or malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

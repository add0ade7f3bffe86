use std::time::Duration;

use polysentry::api::create_router;
use polysentry::config::AppConfig;
use polysentry::intelligence::classifier::FreshnessRules;
use polysentry::polymarket::{DataClient, GammaClient};
use polysentry::services::{collector, detector, resolution, run_periodic, wallet_stats};
use polysentry::{db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    let metrics_handle = polysentry::metrics::init_metrics()?;

    tracing::info!("Connecting to database...");
    let db = db::init_pool(&config.database_url).await?;
    db::run_migrations(&db).await?;
    tracing::info!("Database connected, migrations applied");

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(concat!("polysentry/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let data_client = DataClient::with_base_url(http.clone(), config.data_api_url.clone());
    let gamma_client = GammaClient::with_base_url(http, config.gamma_api_url.clone());
    let max_backoff = Duration::from_secs(config.max_backoff_secs);

    // --- Collector: Data API trades + Gamma markets → store ---
    if config.collector_enabled {
        let pool = db.clone();
        let cfg = config.clone();
        let data_client = data_client.clone();
        let gamma_client = gamma_client.clone();
        tokio::spawn(async move {
            run_periodic(
                "collector",
                Duration::from_secs(cfg.collection_interval_secs),
                max_backoff,
                || async {
                    collector::run_collection_pass(&pool, &data_client, &gamma_client, &cfg)
                        .await
                        .map(|_| ())
                },
            )
            .await;
        });
    } else {
        tracing::info!("Collector disabled (COLLECTOR_ENABLED=false)");
    }

    // --- Detector: score recent trades → alerts ---
    if config.detector_enabled {
        let pool = db.clone();
        let detection = config.detection.clone();
        let batch_size = config.detection_batch_size;
        let interval = Duration::from_secs(config.detection_interval_secs);
        tokio::spawn(async move {
            run_periodic("detector", interval, max_backoff, || async {
                detector::run_detection_pass(&pool, &detection, batch_size)
                    .await
                    .map(|_| ())
            })
            .await;
        });
    } else {
        tracing::info!("Detector disabled (DETECTOR_ENABLED=false)");
    }

    // --- Resolution: settle alerts, then sweep wallet stats ---
    if config.resolution_enabled {
        let pool = db.clone();
        let rules = FreshnessRules::from(&config.detection);
        let interval = Duration::from_secs(config.resolution_interval_secs);
        tokio::spawn(async move {
            run_periodic("resolution", interval, max_backoff, || async {
                resolution::run_resolution_pass(&pool, &gamma_client, &rules).await?;
                wallet_stats::sweep_all(&pool, &rules).await?;
                Ok::<(), anyhow::Error>(())
            })
            .await;
        });
    } else {
        tracing::info!("Resolution disabled (RESOLUTION_ENABLED=false)");
    }

    let state = AppState {
        db,
        config,
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

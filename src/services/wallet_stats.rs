use metrics::gauge;
use sqlx::PgPool;

use crate::db::wallet_repo;
use crate::intelligence::classifier::{self, FreshnessRules};

/// Recompute stats for the given wallets, one at a time. Per-wallet failures
/// are logged and counted; returns how many wallets were refreshed.
pub async fn refresh_wallets(
    pool: &PgPool,
    rules: &FreshnessRules,
    addresses: &[String],
) -> usize {
    let mut refreshed = 0;

    for address in addresses {
        match classifier::recompute_stats(pool, rules, address).await {
            Ok(_) => refreshed += 1,
            Err(e) => {
                tracing::error!(error = %e, wallet = %address, "Wallet stats recompute failed");
            }
        }
    }

    refreshed
}

/// Sweep every known wallet and publish the fresh-wallet gauge.
pub async fn sweep_all(pool: &PgPool, rules: &FreshnessRules) -> anyhow::Result<usize> {
    let addresses = wallet_repo::get_all_addresses(pool).await?;
    let refreshed = refresh_wallets(pool, rules, &addresses).await;

    let fresh = wallet_repo::count_fresh_wallets(pool).await?;
    gauge!("fresh_wallets").set(fresh as f64);

    tracing::info!(
        wallets = addresses.len(),
        refreshed,
        fresh,
        "Wallet stats sweep complete"
    );

    Ok(refreshed)
}

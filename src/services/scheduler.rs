use std::future::Future;
use std::time::Instant;

use metrics::counter;
use tokio::time::{sleep, Duration};

/// Delay before the next pass. After `failures` consecutive failed passes the
/// base interval doubles per failure, capped at `max`.
pub fn backoff_delay(base: Duration, failures: u32, max: Duration) -> Duration {
    if failures == 0 {
        return base;
    }
    let cap = max.max(base);
    base.saturating_mul(2u32.saturating_pow(failures)).min(cap)
}

/// Run `job` forever, `interval` apart. A failed pass is logged and counted,
/// then the loop backs off exponentially; the first success resets it.
pub async fn run_periodic<F, Fut>(
    name: &'static str,
    interval: Duration,
    max_backoff: Duration,
    mut job: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let mut failures: u32 = 0;

    tracing::info!(job = name, interval_secs = interval.as_secs(), "Job started");

    loop {
        let start = Instant::now();

        match job().await {
            Ok(()) => {
                if failures > 0 {
                    tracing::info!(job = name, after = failures, "Job recovered");
                }
                failures = 0;
                tracing::debug!(
                    job = name,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Pass complete"
                );
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                counter!("job_failures_total", "job" => name).increment(1);
                tracing::error!(job = name, error = %e, failures, "Pass failed");
            }
        }

        let delay = backoff_delay(interval, failures, max_backoff);
        if failures > 0 {
            tracing::info!(job = name, delay_secs = delay.as_secs(), "Backing off");
        }
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_failures_uses_interval() {
        let base = Duration::from_secs(300);
        assert_eq!(backoff_delay(base, 0, Duration::from_secs(600)), base);
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        let base = Duration::from_secs(10);
        let max = Duration::from_secs(100);
        assert_eq!(backoff_delay(base, 1, max), Duration::from_secs(20));
        assert_eq!(backoff_delay(base, 2, max), Duration::from_secs(40));
        assert_eq!(backoff_delay(base, 3, max), Duration::from_secs(80));
        assert_eq!(backoff_delay(base, 4, max), max);
        assert_eq!(backoff_delay(base, u32::MAX, max), max);
    }

    #[test]
    fn test_cap_below_interval_keeps_interval() {
        let base = Duration::from_secs(300);
        assert_eq!(backoff_delay(base, 3, Duration::from_secs(60)), base);
    }
}

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::EtlError;

/// Longest single backoff sleep: one day, the scheduler's period.
const MAX_DELAY_MS: u64 = 86_400_000;

pub struct RetryConfig {
    /// Retries after the first attempt.
    max_retries: u32,
    /// Delay before the first retry; doubled for each further one.
    base_delay_ms: u64,
    /// Maximum jitter to add to backoff delay (as fraction of delay, e.g., 0.25 = ±25%).
    jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_retries: 1,
            base_delay_ms: 60_000,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        RetryConfig {
            max_retries,
            base_delay_ms: base_delay.as_millis() as u64,
            ..Default::default()
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

/// Run `func` until it succeeds, fails with a non-retryable error, or the
/// retries are used up. The last error is returned.
pub async fn with_retry<F, Fut, T>(stage: &str, func: F, config: &RetryConfig) -> Result<T, EtlError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, EtlError>>,
{
    let mut attempt = 0;
    loop {
        match func().await {
            Ok(result) => return Ok(result),
            Err(err) if err.is_retryable() && attempt < config.max_retries => {
                let delay = backoff_with_jitter(attempt, config);
                log::warn!("{} failed: {}", stage, err);
                log::warn!(
                    "Retry attempt {}/{} for {} after {:?}",
                    attempt + 1,
                    config.max_retries,
                    stage,
                    delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Calculate backoff delay with jitter for a given attempt.
///
/// Uses exponential backoff: base_delay * 2^attempt, capped at one day.
/// Adds random jitter of ±jitter_factor so reruns don't land on the same second.
fn backoff_with_jitter(attempt: u32, config: &RetryConfig) -> Duration {
    let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
    let base_delay = config.base_delay_ms.saturating_mul(factor).min(MAX_DELAY_MS);
    let jitter_range = (base_delay as f64 * config.jitter_factor) as u64;
    let jitter = rand::rng().random_range(0..=jitter_range * 2) as i64 - jitter_range as i64;
    let delay_ms = (base_delay as i64 + jitter).clamp(0, MAX_DELAY_MS as i64) as u64;
    Duration::from_millis(delay_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_retries: u32) -> RetryConfig {
        RetryConfig::new(max_retries, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_succeeds_after_retryable_failure() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = with_retry(
            "stage",
            move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(EtlError::request("http://localhost", "503"))
                } else {
                    Ok(42)
                }
            },
            &fast(1),
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_returns_last_error_when_retries_exhausted() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), EtlError> = with_retry(
            "stage",
            move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                Err(EtlError::storage("postgres", format!("attempt {}", n)))
            },
            &fast(2),
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(err.to_string().contains("attempt 2"));
    }

    #[tokio::test]
    async fn test_schema_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), EtlError> = with_retry(
            "stage",
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(EtlError::schema("spot", "wave", "missing field `surf`"))
            },
            &fast(3),
        )
        .await;

        assert!(matches!(result, Err(EtlError::Schema { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_retries_runs_once() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), EtlError> = with_retry(
            "stage",
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(EtlError::request("http://localhost", "timeout"))
            },
            &fast(0),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_is_capped_for_late_attempts() {
        let config = RetryConfig::new(100, Duration::from_secs(60));
        for attempt in [20, 63, 64, 100, u32::MAX] {
            let delay = backoff_with_jitter(attempt, &config);
            assert!(delay <= Duration::from_millis(MAX_DELAY_MS), "attempt {}", attempt);
        }

        let zero = RetryConfig::new(100, Duration::ZERO);
        assert_eq!(backoff_with_jitter(64, &zero), Duration::ZERO);
    }

    #[test]
    fn test_backoff_stays_within_jitter() {
        let config = RetryConfig::new(3, Duration::from_millis(1000));
        for attempt in 0..3 {
            let base = 1000 * 2u64.pow(attempt);
            let delay = backoff_with_jitter(attempt, &config).as_millis() as u64;
            assert!(delay >= base - base / 10 && delay <= base + base / 10);
        }
    }
}

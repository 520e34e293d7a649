//! Exponential backoff for provider network calls.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use claiss_core::StorageConfig;

const MAX_ATTEMPTS: u32 = 5;
const BASE_DELAY_MS: u64 = 1000;
const MULTIPLIER: u32 = 2;

/// Retry policy: up to `max_attempts` tries, waiting
/// `base_delay * multiplier^(k-2)` before attempt `k >= 2`. No jitter.
///
/// The policy holds no per-call state, so concurrent callers each run an
/// independent attempt sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            base_delay: Duration::from_millis(BASE_DELAY_MS),
            multiplier: MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            multiplier: MULTIPLIER,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(
            config.retry_max_attempts,
            Duration::from_millis(config.retry_base_delay_ms),
        )
    }

    /// Delay to wait before the 1-based `attempt`; `None` for the first one.
    pub fn delay_before(&self, attempt: u32) -> Option<Duration> {
        if attempt < 2 {
            return None;
        }
        let factor = self.multiplier.saturating_pow(attempt - 2);
        Some(self.base_delay.saturating_mul(factor))
    }

    /// Run `operation` until it succeeds or the attempt budget is spent.
    ///
    /// Returns the first success. On exhaustion the error from the last
    /// attempt is returned; earlier errors are only logged.
    pub async fn run<T, E, F, Fut>(&self, label: &str, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.run_while(label, |_| true, operation).await
    }

    /// Like [`run`](Self::run), but an error for which `retryable` returns
    /// false is returned at once without spending the remaining budget.
    pub async fn run_while<T, E, R, F, Fut>(
        &self,
        label: &str,
        retryable: R,
        mut operation: F,
    ) -> Result<T, E>
    where
        R: Fn(&E) -> bool,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            if let Some(delay) = self.delay_before(attempt) {
                tracing::info!(
                    operation = label,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying after backoff"
                );
                tokio::time::sleep(delay).await;
            }

            let outcome = operation().await;
            tracing::debug!(
                operation = label,
                attempt,
                max_attempts,
                outcome = if outcome.is_ok() { "success" } else { "failure" },
                "Attempt finished"
            );

            match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(
                            operation = label,
                            attempt,
                            max_attempts,
                            "Operation succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!(
                        operation = label,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Attempt failed"
                    );
                    if !retryable(&e) {
                        tracing::error!(
                            operation = label,
                            attempt,
                            error = %e,
                            "Non-retryable failure"
                        );
                        return Err(e);
                    }
                    if attempt >= max_attempts {
                        tracing::error!(
                            operation = label,
                            max_attempts,
                            error = %e,
                            "All attempts failed"
                        );
                        return Err(e);
                    }
                }
            }

            attempt += 1;
        }
    }
}

/// Run `operation` with the default backoff and the given attempt budget.
pub async fn with_retry<T, E, F, Fut>(label: &str, max_attempts: u32, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    RetryPolicy {
        max_attempts,
        ..RetryPolicy::default()
    }
    .run(label, operation)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    #[test]
    fn test_delay_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_before(1), None);
        assert_eq!(policy.delay_before(2), Some(Duration::from_millis(1000)));
        assert_eq!(policy.delay_before(3), Some(Duration::from_millis(2000)));
        assert_eq!(policy.delay_before(4), Some(Duration::from_millis(4000)));
        assert_eq!(policy.delay_before(5), Some(Duration::from_millis(8000)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_exhausts_budget_with_backoff() {
        let attempts = Arc::new(Mutex::new(Vec::<Instant>::new()));

        let recorded = attempts.clone();
        let result: Result<(), String> = with_retry("always fails", 5, || {
            let recorded = recorded.clone();
            async move {
                let mut guard = recorded.lock().unwrap();
                guard.push(Instant::now());
                Err(format!("failure #{}", guard.len()))
            }
        })
        .await;

        assert_eq!(result.unwrap_err(), "failure #5");

        let attempts = attempts.lock().unwrap();
        assert_eq!(attempts.len(), 5);
        let gaps: Vec<u128> = attempts
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).as_millis())
            .collect();
        assert_eq!(gaps, vec![1000, 2000, 4000, 8000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_first_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let counter = calls.clone();
        let result: Result<&str, String> = RetryPolicy::default()
            .run("flaky", || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err("transient".to_string())
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success_does_not_sleep() {
        let start = Instant::now();
        let result: Result<u8, String> = with_retry("ok", 5, || async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_stops_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let counter = calls.clone();
        let result: Result<(), String> = RetryPolicy::default()
            .run_while(
                "misconfigured",
                |e: &String| !e.starts_with("config"),
                || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Err("config: bucket missing".to_string())
                    }
                },
            )
            .await;

        assert_eq!(result.unwrap_err(), "config: bucket missing");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_still_attempts_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), String> = with_retry("once", 0, || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err("nope".to_string())
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

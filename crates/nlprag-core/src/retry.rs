//! Bounded retry with fixed or exponential backoff.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::TRACING_TARGET_RETRY;

/// Configuration for retry behavior on failed operations.
///
/// `max_attempts` counts every attempt, including the first one, so a policy
/// with `max_attempts = 3` calls the operation at most three times.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (values below 1 behave as 1).
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
    /// Backoff multiplier, `1.0` gives a fixed delay.
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    /// Three attempts with a fixed two second delay.
    fn default() -> Self {
        Self::fixed(3, Duration::from_secs(2))
    }
}

impl RetryPolicy {
    /// Creates a policy with a constant delay between attempts.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff: delay,
            max_backoff: delay,
            backoff_multiplier: 1.0,
        }
    }

    /// Creates a policy whose delay doubles after every failed attempt.
    pub fn exponential(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            max_backoff,
            backoff_multiplier: 2.0,
        }
    }

    /// Creates a policy that never retries.
    pub fn no_retry() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    /// Set the maximum backoff duration.
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Set the backoff multiplier.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Returns the number of attempts this policy allows.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Calculates the delay that follows the given failed attempt (zero-based).
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let backoff_millis =
            (self.initial_backoff.as_millis() as f64) * self.backoff_multiplier.powi(exponent);
        let backoff = Duration::from_millis(backoff_millis.min(u64::MAX as f64) as u64);
        backoff.min(self.max_backoff.max(self.initial_backoff))
    }

    /// Retries an async operation on every error.
    ///
    /// # Example
    /// ```ignore
    /// let policy = RetryPolicy::default();
    /// policy.retry(|| async { backend.create_collection("classify", &params).await }).await?;
    /// ```
    pub async fn retry<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.retry_if(operation, |_| true).await
    }

    /// Retries an async operation while the predicate accepts the error.
    pub async fn retry_if<F, Fut, T, E, P>(&self, mut operation: F, mut should_retry: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
        P: FnMut(&E) -> bool,
    {
        let attempts = self.attempts();
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;

                    if attempt >= attempts || !should_retry(&err) {
                        tracing::debug!(
                            target: TRACING_TARGET_RETRY,
                            attempt,
                            max_attempts = attempts,
                            error = %err,
                            "Giving up on operation"
                        );
                        return Err(err);
                    }

                    let backoff = self.calculate_backoff(attempt - 1);
                    tracing::warn!(
                        target: TRACING_TARGET_RETRY,
                        attempt,
                        max_attempts = attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "Attempt failed, retrying after backoff"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn test_fixed_backoff_is_constant() {
        let policy = RetryPolicy::fixed(3, Duration::from_secs(2));
        assert_eq!(policy.calculate_backoff(0), Duration::from_secs(2));
        assert_eq!(policy.calculate_backoff(1), Duration::from_secs(2));
        assert_eq!(policy.calculate_backoff(5), Duration::from_secs(2));
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let policy =
            RetryPolicy::exponential(5, Duration::from_millis(100), Duration::from_millis(350));
        assert_eq!(policy.calculate_backoff(0), Duration::from_millis(100));
        assert_eq!(policy.calculate_backoff(1), Duration::from_millis(200));
        assert_eq!(policy.calculate_backoff(2), Duration::from_millis(350));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_stops_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::default();

        let started = tokio::time::Instant::now();
        let result: Result<(), String> = policy
            .retry(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("unavailable".to_string())
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_returns_first_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::default();

        let result: Result<u32, String> = policy
            .retry(|| {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n == 0 { Err("busy".to_string()) } else { Ok(n) }
                }
            })
            .await;

        assert_eq!(result, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_if_skips_non_retryable() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::fixed(5, Duration::from_millis(1));

        let result: Result<(), String> = policy
            .retry_if(
                || {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err("fatal".to_string())
                    }
                },
                |err| err != "fatal",
            )
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_retry_allows_single_attempt() {
        assert_eq!(RetryPolicy::no_retry().attempts(), 1);
        assert_eq!(RetryPolicy::fixed(0, Duration::ZERO).attempts(), 1);
    }
}

//! Retry configuration and the shared retry helper.
//!
//! [`RetryConfig`] controls retry behaviour for outbound requests.
//! [`RetryingTransport`](crate::transport::RetryingTransport) delegates to
//! [`with_retry()`], keeping retry logic in a single place.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::telemetry;
use crate::{LicatError, Result};

/// Configuration for retry behaviour on transient errors.
///
/// Uses exponential backoff. Retries are opt-in via
/// [`LicatBuilder::retry()`](crate::LicatBuilder::retry):
///
/// ```rust
/// # use licat::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::new()
///     .max_attempts(5)
///     .initial_delay(Duration::from_millis(200));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial request).
    /// 1 = no retry. Default: 3.
    pub max_attempts: u32,
    /// Base delay before the first retry. Default: 500ms.
    pub initial_delay: Duration,
    /// Maximum delay between retries (caps exponential growth). Default: 30s.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that disables retries (single attempt).
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set maximum attempts (including the initial request).
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Set the base delay before the first retry.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    ///
    /// Uses exponential backoff: `initial_delay * 2^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        delay.min(self.max_delay)
    }
}

/// Execute an async operation with retry logic.
///
/// Retries on transient errors (as classified by [`LicatError::is_transient()`])
/// up to `config.max_attempts`, using exponential backoff.
///
/// Permanent errors are returned immediately without retry.
pub(crate) async fn with_retry<F, Fut, T>(config: &RetryConfig, operation: &str, f: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err = None;
    for attempt in 0..config.max_attempts.max(1) {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_transient() => {
                if attempt + 1 < config.max_attempts {
                    metrics::counter!(telemetry::RETRIES_TOTAL, "operation" => operation.to_owned())
                        .increment(1);
                    let delay = config.delay_for_attempt(attempt);
                    warn!(
                        operation,
                        attempt = attempt + 1,
                        max_attempts = config.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_err = Some(e);
            }
            Err(e) => return Err(e), // permanent error, no retry
        }
    }
    Err(last_err.unwrap_or_else(|| LicatError::Http(format!("{operation}: no attempt made"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryConfig {
        RetryConfig::new()
            .initial_delay(Duration::from_millis(1))
            .max_delay(Duration::from_millis(2))
    }

    #[test]
    fn delay_doubles_and_caps() {
        let config = RetryConfig::new()
            .initial_delay(Duration::from_millis(100))
            .max_delay(Duration::from_millis(350));
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(350));
    }

    #[test]
    fn disabled_means_single_attempt() {
        assert_eq!(RetryConfig::disabled().max_attempts, 1);
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retry(&fast(), "test", || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(LicatError::Http("reset".into()))
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = with_retry(&fast(), "test", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LicatError::Api {
                status: 404,
                message: "missing".into(),
            })
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_retries_return_last_error() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = with_retry(&fast().max_attempts(2), "test", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LicatError::Api {
                status: 503,
                message: "unavailable".into(),
            })
        })
        .await;
        assert!(matches!(result, Err(LicatError::Api { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

//! Retry decorator.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use super::{Transport, TransportResponse};
use crate::Result;
use crate::retry::{RetryConfig, with_retry};

/// Decorator that wraps a [`Transport`] with retry logic.
///
/// Connection failures and `429`/`5xx` responses are retried with
/// exponential backoff up to `config.max_attempts`. Once attempts are
/// exhausted a non-2xx status surfaces as [`LicatError::Api`](crate::LicatError::Api)
/// instead of an `Ok` response.
pub struct RetryingTransport {
    inner: Arc<dyn Transport>,
    config: RetryConfig,
}

impl RetryingTransport {
    pub fn new(inner: Arc<dyn Transport>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl Transport for RetryingTransport {
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<TransportResponse> {
        with_retry(&self.config, "http_get", || async {
            self.inner.get(url, headers).await?.error_for_status()
        })
        .await
    }
}

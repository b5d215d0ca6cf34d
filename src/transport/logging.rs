//! Request logging decorator.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tracing::debug;

use super::{Transport, TransportResponse};
use crate::Result;

/// Decorator that logs every request at `debug` level.
///
/// Enabled through [`LicatBuilder::log_requests()`](crate::LicatBuilder::log_requests).
/// Headers are not logged.
pub struct LoggingTransport {
    inner: Arc<dyn Transport>,
}

impl LoggingTransport {
    pub fn new(inner: Arc<dyn Transport>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Transport for LoggingTransport {
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<TransportResponse> {
        let start = Instant::now();
        let result = self.inner.get(url, headers).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(response) => debug!(
                method = "GET",
                url,
                status = response.status(),
                elapsed_ms,
                "http request"
            ),
            Err(e) => debug!(method = "GET", url, elapsed_ms, error = %e, "http request failed"),
        }
        result
    }
}

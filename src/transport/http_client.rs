//! reqwest-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::HeaderMap;

use super::{Transport, TransportResponse};
use crate::{LicatError, Result};

/// [`Transport`] over a [`reqwest::Client`].
///
/// The body is streamed chunk by chunk from the connection, so the catalog
/// reader can start decoding before the full listing has arrived.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    /// Create a transport with its own HTTP client.
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LicatError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// Wrap an existing client (connection pool, TLS and proxy settings are
    /// taken as-is).
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<TransportResponse> {
        let response = self
            .http
            .get(url)
            .headers(headers.clone())
            .send()
            .await
            .map_err(|e| LicatError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(LicatError::from));

        Ok(TransportResponse::new(status, Box::pin(body)))
    }
}

//! HTTP transport seam.
//!
//! Everything licat sends over the wire goes through a [`Transport`]: the
//! catalog listing, filtered listings and the per-license html pages. The
//! default implementation is [`ReqwestTransport`]. Tests and embedders can
//! supply their own implementation through
//! [`LicatBuilder::transport()`](crate::LicatBuilder::transport).
//!
//! # Decorators
//!
//! Cross-cutting behaviour wraps a transport rather than living in it:
//!
//! - [`LoggingTransport`]: one `tracing` event per request
//! - [`RetryingTransport`]: retries transient failures per [`RetryConfig`](crate::RetryConfig)
//!
//! # Ownership
//!
//! Transports are shared as `Arc<dyn Transport>`. A client only drops its own
//! handle on close; a transport supplied by the caller stays usable by the
//! caller afterwards.

mod http_client;
mod logging;
mod retrying;

pub use http_client::ReqwestTransport;
pub use logging::LoggingTransport;
pub use retrying::RetryingTransport;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt, stream};
use reqwest::header::HeaderMap;

use crate::{LicatError, Result};

/// Response body as a stream of byte chunks.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// Status and body of an HTTP response.
///
/// The body is exposed as a chunk stream so callers can decode
/// incrementally; [`bytes()`](Self::bytes) collects it when they cannot.
pub struct TransportResponse {
    status: u16,
    body: BodyStream,
}

impl TransportResponse {
    /// Build a response from a status and a chunk stream.
    pub fn new(status: u16, body: BodyStream) -> Self {
        Self { status, body }
    }

    /// Build a response whose body is delivered as a single chunk.
    pub fn from_bytes(status: u16, body: impl Into<Vec<u8>>) -> Self {
        let chunk: Result<Vec<u8>> = Ok(body.into());
        Self::new(status, Box::pin(stream::once(async move { chunk })))
    }

    /// Build a response whose body is delivered in the given chunks.
    pub fn from_chunks(status: u16, chunks: Vec<Vec<u8>>) -> Self {
        Self::new(status, Box::pin(stream::iter(chunks.into_iter().map(Ok))))
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into [`LicatError::Api`].
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(LicatError::Api {
                status: self.status,
                message: format!("server returned HTTP {}", self.status),
            })
        }
    }

    pub fn into_body(self) -> BodyStream {
        self.body
    }

    /// Collect the whole body.
    pub async fn bytes(self) -> Result<Vec<u8>> {
        let mut body = self.body;
        let mut buf = Vec::new();
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Issues HTTP GET requests.
///
/// Implementations return `Ok` for any HTTP status; only failures to obtain a
/// response at all (connection, DNS, timeout) are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<TransportResponse>;
}

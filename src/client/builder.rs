//! Builder for configuring catalog clients

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue, USER_AGENT};

use super::CatalogClient;
use crate::blocking;
use crate::cache::{SnapshotCache, TextCache, TextCacheConfig};
use crate::catalog::CatalogReader;
use crate::content::{ContentFetcher, DEFAULT_CONTENT_SELECTOR, default_max_concurrency};
use crate::retry::RetryConfig;
use crate::transport::{LoggingTransport, ReqwestTransport, RetryingTransport, Transport};
use crate::{LicatError, Result};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://opensource.org/api/";

/// Default listing path under the API root.
pub const DEFAULT_LICENSES_PATH: &str = "licenses";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default `User-Agent` header value.
pub const DEFAULT_USER_AGENT: &str = concat!("licat/", env!("CARGO_PKG_VERSION"));

/// Main entry point for creating catalog clients.
pub struct Licat;

impl Licat {
    /// Create a new builder for configuring the client.
    pub fn builder() -> LicatBuilder {
        LicatBuilder::new()
    }
}

/// Builder for configuring catalog clients.
pub struct LicatBuilder {
    base_url: String,
    licenses_path: String,
    timeout: Duration,
    user_agent: Option<String>,
    headers: Vec<(String, String)>,
    transport: Option<Arc<dyn Transport>>,
    http_client: Option<reqwest::Client>,
    max_concurrency: Option<usize>,
    content_selector: String,
    cache_snapshot: bool,
    text_cache: Option<TextCacheConfig>,
    retry: Option<RetryConfig>,
    log_requests: bool,
}

impl LicatBuilder {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            licenses_path: DEFAULT_LICENSES_PATH.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            headers: Vec::new(),
            transport: None,
            http_client: None,
            max_concurrency: None,
            content_selector: DEFAULT_CONTENT_SELECTOR.to_string(),
            cache_snapshot: true,
            text_cache: None,
            retry: None,
            log_requests: false,
        }
    }

    /// Build a builder from a loaded [`ClientConfig`](crate::ClientConfig).
    ///
    /// Settings absent from the config keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_config(config: &crate::ClientConfig) -> Self {
        config.apply(Self::new())
    }

    /// Set the API root (default: `https://opensource.org/api/`).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the listing path under the API root (default: `licenses`).
    ///
    /// Some deployments serve the listing at `license` instead.
    pub fn licenses_path(mut self, path: impl Into<String>) -> Self {
        self.licenses_path = path.into();
        self
    }

    /// Set the request timeout of the built-in HTTP client (default: 30s).
    ///
    /// Ignored when a transport or HTTP client is supplied.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the `User-Agent` sent when the caller's headers carry none.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Add a header to every request.
    ///
    /// Caller headers take precedence: `Accept` and `User-Agent` defaults are
    /// only added when not set here. Invalid names or values fail
    /// [`build()`](Self::build).
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Use an externally owned transport.
    ///
    /// The client keeps a shared handle only; closing the client leaves the
    /// transport usable by its owner.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use an existing reqwest client (connection pool, proxy, TLS settings).
    ///
    /// The client's own default headers are left in charge: no `Accept` or
    /// `User-Agent` defaults are added to its requests. Headers set with
    /// [`header()`](Self::header) or [`user_agent()`](Self::user_agent) are
    /// still sent.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Cap simultaneous license text fetches (default: `max(2, cores)`).
    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = Some(n);
        self
    }

    /// CSS selector of the element holding license text (default: `.license-content`).
    pub fn content_selector(mut self, selector: impl Into<String>) -> Self {
        self.content_selector = selector.into();
        self
    }

    /// Keep the published snapshot between calls (default: true).
    ///
    /// When disabled, every bulk read runs a fresh population pass.
    pub fn cache_snapshot(mut self, enabled: bool) -> Self {
        self.cache_snapshot = enabled;
        self
    }

    /// Enable the license text cache.
    ///
    /// Without this, no cache is allocated.
    pub fn text_cache(mut self, config: TextCacheConfig) -> Self {
        self.text_cache = Some(config);
        self
    }

    /// Retry transient failures of every request.
    ///
    /// Without this, each request is attempted once.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = Some(config);
        self
    }

    /// Log every request at `debug` level.
    pub fn log_requests(mut self, enabled: bool) -> Self {
        self.log_requests = enabled;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<CatalogClient> {
        if self.transport.is_some() && self.http_client.is_some() {
            return Err(LicatError::Configuration(
                "transport and http_client are mutually exclusive".to_string(),
            ));
        }
        let max_concurrency = match self.max_concurrency {
            Some(0) => {
                return Err(LicatError::Configuration(
                    "max_concurrency must be at least 1".to_string(),
                ));
            }
            Some(n) => n,
            None => default_max_concurrency(),
        };

        // A supplied reqwest client carries its own default headers, which
        // per-request headers would override.
        let client_owns_defaults = self.http_client.is_some();
        let mut transport: Arc<dyn Transport> = match (self.transport, self.http_client) {
            (Some(transport), _) => transport,
            (None, Some(client)) => Arc::new(ReqwestTransport::with_client(client)),
            (None, None) => Arc::new(ReqwestTransport::new(self.timeout)?),
        };
        if self.log_requests {
            transport = Arc::new(LoggingTransport::new(transport));
        }
        if let Some(config) = self.retry {
            transport = Arc::new(RetryingTransport::new(transport, config));
        }

        let mut caller_headers = parse_headers(&self.headers)?;
        let (json_headers, html_headers) = if client_owns_defaults {
            if let Some(user_agent) = &self.user_agent {
                caller_headers
                    .entry(USER_AGENT)
                    .or_insert(header_value(user_agent)?);
            }
            (caller_headers.clone(), caller_headers)
        } else {
            let user_agent =
                header_value(self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))?;
            (
                with_defaults(
                    &caller_headers,
                    HeaderValue::from_static("application/json"),
                    &user_agent,
                ),
                with_defaults(
                    &caller_headers,
                    HeaderValue::from_static("text/html"),
                    &user_agent,
                ),
            )
        };

        let text_cache = self.text_cache.as_ref().map(TextCache::new);
        let reader = CatalogReader::new(
            transport.clone(),
            &self.base_url,
            &self.licenses_path,
            json_headers,
        )?;
        let fetcher = ContentFetcher::new(
            transport,
            html_headers,
            &self.content_selector,
            max_concurrency,
            text_cache,
        )?;

        Ok(CatalogClient::new(SnapshotCache::new(
            reader,
            fetcher,
            self.cache_snapshot,
        )))
    }

    /// Build a synchronous client.
    ///
    /// The returned client drives its own single-threaded runtime and must
    /// not be used from inside an async context.
    pub fn build_blocking(self) -> Result<blocking::CatalogClient> {
        blocking::CatalogClient::new(self.build()?)
    }
}

impl Default for LicatBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_headers(headers: &[(String, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| LicatError::Configuration(format!("invalid header name {name:?}: {e}")))?;
        map.insert(name, header_value(value)?);
    }
    Ok(map)
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| LicatError::Configuration(format!("invalid header value {value:?}: {e}")))
}

/// Caller headers plus `Accept` and `User-Agent`, each added only when absent.
fn with_defaults(caller: &HeaderMap, accept: HeaderValue, user_agent: &HeaderValue) -> HeaderMap {
    let mut headers = caller.clone();
    headers.entry(ACCEPT).or_insert(accept);
    headers
        .entry(USER_AGENT)
        .or_insert_with(|| user_agent.clone());
    headers
}

//! License text enrichment.
//!
//! [`ContentFetcher`] downloads a license's html detail page and extracts the
//! text of the first element matching the content selector
//! (`.license-content` by default). Every failure degrades to an empty
//! string; callers never see an error from this path.

use std::sync::Arc;
use std::time::Instant;

use reqwest::header::HeaderMap;
use scraper::{Html, Selector};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::cache::TextCache;
use crate::telemetry;
use crate::transport::Transport;
use crate::{LicatError, Result};

/// CSS selector of the element holding the license body.
pub const DEFAULT_CONTENT_SELECTOR: &str = ".license-content";

/// Default cap on simultaneous detail-page requests: `max(2, cores)`.
pub fn default_max_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(2)
}

/// Fetches and extracts license text from detail pages.
///
/// All fetches made through one fetcher share a single throttle, so bulk
/// population and concurrent filtered fetches together never exceed
/// [`max_concurrency()`](Self::max_concurrency) in-flight page requests.
pub struct ContentFetcher {
    transport: Arc<dyn Transport>,
    headers: HeaderMap,
    selector: Selector,
    throttle: Arc<Semaphore>,
    max_concurrency: usize,
    text_cache: Option<TextCache>,
}

impl ContentFetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        headers: HeaderMap,
        content_selector: &str,
        max_concurrency: usize,
        text_cache: Option<TextCache>,
    ) -> Result<Self> {
        let selector = Selector::parse(content_selector).map_err(|e| {
            LicatError::Configuration(format!("invalid content selector {content_selector:?}: {e}"))
        })?;
        let max_concurrency = max_concurrency.max(1);
        Ok(Self {
            transport,
            headers,
            selector,
            throttle: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
            text_cache,
        })
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Retrieve the license text behind `html_uri`.
    ///
    /// Returns an empty string when the request fails, the server answers
    /// with a non-2xx status, or the page has no matching element.
    pub async fn fetch(&self, html_uri: &str) -> String {
        if let Some(cache) = &self.text_cache
            && let Some(text) = cache.get(html_uri).await
        {
            return text;
        }

        let Ok(_permit) = self.throttle.acquire().await else {
            return String::new();
        };

        let start = Instant::now();
        let result = self.download(html_uri).await;
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS, "endpoint" => "content")
            .record(start.elapsed().as_secs_f64());

        match result {
            Ok(html) => {
                metrics::counter!(telemetry::REQUESTS_TOTAL, "endpoint" => "content", "status" => "ok")
                    .increment(1);
                let text = extract_text(&html, &self.selector);
                if text.is_empty() {
                    debug!(url = html_uri, "no license content element on page");
                } else if let Some(cache) = &self.text_cache {
                    cache.insert(html_uri, &text).await;
                }
                text
            }
            Err(e) => {
                metrics::counter!(telemetry::REQUESTS_TOTAL, "endpoint" => "content", "status" => "error")
                    .increment(1);
                warn!(url = html_uri, error = %e, "license text fetch failed");
                String::new()
            }
        }
    }

    async fn download(&self, html_uri: &str) -> Result<String> {
        let body = self
            .transport
            .get(html_uri, &self.headers)
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// Text of the first element matching `selector`, trimmed, with entities decoded.
///
/// Kept synchronous: the parsed document is not `Send` and must not live
/// across an await point.
pub fn extract_text(html: &str, selector: &Selector) -> String {
    let document = Html::parse_document(html);
    document
        .select(selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

//! Opt-in cache of enrichment text.
//!
//! [`TextCache`] remembers the text extracted from each license detail page,
//! keyed by the page URI. It outlives snapshot generations: a client running
//! with `cache_snapshot(false)` re-fetches the catalog on every call but can
//! still skip the per-record html requests.
//!
//! Only non-empty extractions are stored, so a degraded fetch is retried on
//! the next population instead of being pinned for the TTL.

use std::time::Duration;

use moka::future::Cache;

use crate::telemetry;

/// Configuration for the text cache.
///
/// Pass to [`LicatBuilder::text_cache()`](crate::LicatBuilder::text_cache)
/// to activate. Without this, no cache is allocated.
///
/// ```rust
/// # use licat::TextCacheConfig;
/// # use std::time::Duration;
/// let config = TextCacheConfig::new()
///     .max_entries(500)
///     .ttl(Duration::from_secs(6 * 3600));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TextCacheConfig {
    /// Maximum number of cached pages. Default: 1,000.
    pub max_entries: u64,
    /// Time-to-live for cached text. Default: 24 hours.
    pub ttl: Duration,
}

impl Default for TextCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_000,
            ttl: Duration::from_secs(24 * 3600),
        }
    }
}

impl TextCacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached pages.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the time-to-live for cached text.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// In-memory LRU + TTL cache of license text keyed by html URI.
#[derive(Clone)]
pub struct TextCache {
    cache: Cache<String, String>,
}

impl TextCache {
    pub fn new(config: &TextCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();
        Self { cache }
    }

    /// Look up cached text. Emits hit/miss metrics.
    pub async fn get(&self, html_uri: &str) -> Option<String> {
        match self.cache.get(html_uri).await {
            Some(text) => {
                metrics::counter!(telemetry::TEXT_CACHE_HITS_TOTAL).increment(1);
                Some(text)
            }
            None => {
                metrics::counter!(telemetry::TEXT_CACHE_MISSES_TOTAL).increment(1);
                None
            }
        }
    }

    /// Store extracted text. Empty text is ignored.
    pub async fn insert(&self, html_uri: &str, text: &str) {
        if text.is_empty() {
            return;
        }
        self.cache
            .insert(html_uri.to_string(), text.to_string())
            .await;
    }

    /// Approximate number of cached entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_returns_text() {
        let cache = TextCache::new(&TextCacheConfig::default());
        assert_eq!(cache.get("https://x/mit/").await, None);

        cache.insert("https://x/mit/", "MIT TEXT").await;
        assert_eq!(cache.get("https://x/mit/").await.as_deref(), Some("MIT TEXT"));
    }

    #[tokio::test]
    async fn empty_text_is_not_cached() {
        let cache = TextCache::new(&TextCacheConfig::default());
        cache.insert("https://x/empty/", "").await;
        assert_eq!(cache.get("https://x/empty/").await, None);
    }

    #[test]
    fn config_builder() {
        let config = TextCacheConfig::new()
            .max_entries(5)
            .ttl(Duration::from_secs(1));
        assert_eq!(config.max_entries, 5);
        assert_eq!(config.ttl, Duration::from_secs(1));
    }
}

//! File-based client configuration.
//!
//! A TOML file mirrors the [`LicatBuilder`](crate::LicatBuilder) options.
//! Every key is optional:
//!
//! ```toml
//! base_url = "https://opensource.org/api/"
//! licenses_path = "licenses"
//! timeout_secs = 30
//! user_agent = "my-tool/1.0"
//! max_concurrency = 4
//! content_selector = ".license-content"
//! cache_snapshot = true
//! log_requests = false
//!
//! [headers]
//! X-Request-Source = "nightly-audit"
//!
//! [retry]
//! max_attempts = 3
//! initial_delay_ms = 500
//! max_delay_ms = 30000
//!
//! [text_cache]
//! max_entries = 1000
//! ttl_secs = 86400
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::cache::TextCacheConfig;
use crate::client::LicatBuilder;
use crate::retry::RetryConfig;
use crate::{LicatError, Result};

/// Client configuration loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub licenses_path: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub max_concurrency: Option<usize>,
    #[serde(default)]
    pub content_selector: Option<String>,
    #[serde(default)]
    pub cache_snapshot: Option<bool>,
    #[serde(default)]
    pub log_requests: Option<bool>,
    /// Extra headers sent with every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Present to enable retries.
    #[serde(default)]
    pub retry: Option<RetrySection>,
    /// Present to enable the license text cache.
    #[serde(default)]
    pub text_cache: Option<TextCacheSection>,
}

/// `[retry]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

impl From<&RetrySection> for RetryConfig {
    fn from(section: &RetrySection) -> Self {
        RetryConfig::new()
            .max_attempts(section.max_attempts)
            .initial_delay(Duration::from_millis(section.initial_delay_ms))
            .max_delay(Duration::from_millis(section.max_delay_ms))
    }
}

/// `[text_cache]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextCacheSection {
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_max_entries() -> u64 {
    1_000
}

fn default_ttl_secs() -> u64 {
    24 * 3600
}

impl From<&TextCacheSection> for TextCacheConfig {
    fn from(section: &TextCacheSection) -> Self {
        TextCacheConfig::new()
            .max_entries(section.max_entries)
            .ttl(Duration::from_secs(section.ttl_secs))
    }
}

impl ClientConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| LicatError::Configuration(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            LicatError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            LicatError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Apply every setting present in the file to `builder`.
    pub(crate) fn apply(&self, mut builder: LicatBuilder) -> LicatBuilder {
        if let Some(url) = &self.base_url {
            builder = builder.base_url(url);
        }
        if let Some(path) = &self.licenses_path {
            builder = builder.licenses_path(path);
        }
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent);
        }
        if let Some(n) = self.max_concurrency {
            builder = builder.max_concurrency(n);
        }
        if let Some(selector) = &self.content_selector {
            builder = builder.content_selector(selector);
        }
        if let Some(enabled) = self.cache_snapshot {
            builder = builder.cache_snapshot(enabled);
        }
        if let Some(enabled) = self.log_requests {
            builder = builder.log_requests(enabled);
        }
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }
        if let Some(retry) = &self.retry {
            builder = builder.retry(retry.into());
        }
        if let Some(text_cache) = &self.text_cache {
            builder = builder.text_cache(text_cache.into());
        }
        builder
    }
}

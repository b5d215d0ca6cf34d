//! Telemetry metric name constants.
//!
//! Centralised metric names for licat operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `licat_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `endpoint`: "catalog", "filtered" or "content"
//! - `status`: "ok" or "error"
//! - `outcome`: "published", "degraded" or "cancelled"

/// Total HTTP requests issued by the catalog reader and content fetcher.
///
/// Labels: `endpoint`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "licat_requests_total";

/// Request duration in seconds.
///
/// Labels: `endpoint`.
pub const REQUEST_DURATION_SECONDS: &str = "licat_request_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `operation`.
pub const RETRIES_TOTAL: &str = "licat_retries_total";

/// Total per-record enrichment attempts.
///
/// Labels: `status` ("ok" | "empty" | "cancelled").
pub const ENRICHMENTS_TOTAL: &str = "licat_enrichments_total";

/// Total population attempts.
///
/// Labels: `outcome`.
pub const POPULATIONS_TOTAL: &str = "licat_populations_total";

/// Reads answered from the published snapshot without a population pass.
pub const SNAPSHOT_HITS_TOTAL: &str = "licat_snapshot_hits_total";

/// Total text cache hits.
pub const TEXT_CACHE_HITS_TOTAL: &str = "licat_text_cache_hits_total";

/// Total text cache misses.
pub const TEXT_CACHE_MISSES_TOTAL: &str = "licat_text_cache_misses_total";

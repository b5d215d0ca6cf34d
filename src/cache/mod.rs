//! Caching layer.
//!
//! - [`SnapshotCache`]: the populate-once catalog snapshot behind every read
//! - [`TextCache`]: opt-in cache of license text keyed by detail-page URI

mod snapshot;
mod text;

pub use snapshot::SnapshotCache;
pub use text::{TextCache, TextCacheConfig};

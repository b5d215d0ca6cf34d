//! Public client API.
//!
//! [`Licat::builder()`] configures and builds a [`CatalogClient`], the async
//! facade over the [`SnapshotCache`](crate::cache::SnapshotCache). Read
//! methods never surface network failures: they degrade to empty or partial
//! results. Only [`CatalogClient::initialize()`] reports a failed population,
//! and every method fails with [`LicatError::Disposed`] once the client has
//! been closed.

mod builder;

pub use builder::{
    DEFAULT_BASE_URL, DEFAULT_LICENSES_PATH, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, Licat,
    LicatBuilder,
};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cache::SnapshotCache;
use crate::types::{FilterParam, Keyword, License};
use crate::{LicatError, Result};

/// Async client for the license catalog.
///
/// Cheap to clone; clones share the same snapshot and transport.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<Inner>,
}

struct Inner {
    cache: SnapshotCache,
    closed: AtomicBool,
}

impl CatalogClient {
    pub(crate) fn new(cache: SnapshotCache) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache,
                closed: AtomicBool::new(false),
            }),
        }
    }

    fn cache(&self) -> Result<&SnapshotCache> {
        if self.is_closed() {
            return Err(LicatError::Disposed);
        }
        Ok(&self.inner.cache)
    }

    /// All licenses, sorted by SPDX id (or name) ignoring case.
    ///
    /// The first call populates the snapshot; later calls return the same
    /// `Arc` without touching the network.
    pub async fn get_all(&self) -> Result<Arc<Vec<License>>> {
        self.get_all_with_cancel(&CancellationToken::new()).await
    }

    pub async fn get_all_with_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Arc<Vec<License>>> {
        Ok(self.cache()?.get_all(cancel).await)
    }

    /// Licenses whose name or id contains `query`, ignoring case.
    ///
    /// A blank query returns nothing without a request.
    pub async fn search(&self, query: &str) -> Result<Vec<License>> {
        self.search_with_cancel(query, &CancellationToken::new())
            .await
    }

    pub async fn search_with_cancel(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<License>> {
        Ok(self.cache()?.search(query, cancel).await)
    }

    /// One license by SPDX id or name, ignoring case.
    ///
    /// A blank key returns `None` without a request.
    pub async fn get_by_key(&self, key: &str) -> Result<Option<License>> {
        self.get_by_key_with_cancel(key, &CancellationToken::new())
            .await
    }

    pub async fn get_by_key_with_cancel(
        &self,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<License>> {
        Ok(self.cache()?.get_by_key(key, cancel).await)
    }

    /// Licenses matching a server-side filter, enriched and sorted.
    ///
    /// A blank value returns nothing without a request; request failures
    /// also return nothing.
    pub async fn get_filtered(&self, param: FilterParam, value: &str) -> Result<Vec<License>> {
        self.get_filtered_with_cancel(param, value, &CancellationToken::new())
            .await
    }

    pub async fn get_filtered_with_cancel(
        &self,
        param: FilterParam,
        value: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<License>> {
        Ok(self.cache()?.get_filtered(param, value, cancel).await)
    }

    /// Licenses whose name matches `name` server-side.
    pub async fn get_by_name(&self, name: &str) -> Result<Vec<License>> {
        self.get_filtered(FilterParam::Name, name).await
    }

    /// Licenses tagged with `keyword`.
    pub async fn get_by_keyword(&self, keyword: Keyword) -> Result<Vec<License>> {
        self.get_filtered(FilterParam::Keyword, keyword.as_str())
            .await
    }

    /// Licenses stewarded by `steward`.
    pub async fn get_by_steward(&self, steward: &str) -> Result<Vec<License>> {
        self.get_filtered(FilterParam::Steward, steward).await
    }

    /// Licenses whose SPDX id matches `pattern`; `*` is a wildcard (`gpl*`).
    pub async fn get_by_spdx_pattern(&self, pattern: &str) -> Result<Vec<License>> {
        self.get_filtered(FilterParam::SpdxPattern, pattern).await
    }

    /// Populate the catalog now.
    ///
    /// Unlike the read methods this reports failure: a population that could
    /// not fetch the catalog returns [`LicatError::Initialization`].
    pub async fn initialize(&self) -> Result<()> {
        self.initialize_with_cancel(&CancellationToken::new()).await
    }

    pub async fn initialize_with_cancel(&self, cancel: &CancellationToken) -> Result<()> {
        self.cache()?.initialize(cancel).await
    }

    /// Close the client. Later calls on this client and its clones fail with
    /// [`LicatError::Disposed`]. A transport supplied through the builder is
    /// left untouched.
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            debug!("catalog client closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("licenses_url", &self.inner.cache.reader().licenses_url())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

//! Synchronous client.
//!
//! [`CatalogClient`] mirrors the async [`crate::CatalogClient`] and blocks the
//! calling thread on a private single-threaded runtime. Build one with
//! [`LicatBuilder::build_blocking()`](crate::LicatBuilder::build_blocking).
//!
//! Calling it from inside a tokio runtime panics; use the async client there.

use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use crate::types::{FilterParam, Keyword, License};
use crate::{LicatError, Result};

/// Blocking wrapper around [`crate::CatalogClient`].
pub struct CatalogClient {
    inner: crate::CatalogClient,
    runtime: Runtime,
}

impl CatalogClient {
    pub(crate) fn new(inner: crate::CatalogClient) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LicatError::Configuration(format!("failed to start runtime: {e}")))?;
        Ok(Self { inner, runtime })
    }

    /// The async client this wrapper drives.
    pub fn as_async(&self) -> &crate::CatalogClient {
        &self.inner
    }

    pub fn get_all(&self) -> Result<Arc<Vec<License>>> {
        self.runtime.block_on(self.inner.get_all())
    }

    pub fn search(&self, query: &str) -> Result<Vec<License>> {
        self.runtime.block_on(self.inner.search(query))
    }

    pub fn get_by_key(&self, key: &str) -> Result<Option<License>> {
        self.runtime.block_on(self.inner.get_by_key(key))
    }

    pub fn get_filtered(&self, param: FilterParam, value: &str) -> Result<Vec<License>> {
        self.runtime.block_on(self.inner.get_filtered(param, value))
    }

    pub fn get_by_name(&self, name: &str) -> Result<Vec<License>> {
        self.runtime.block_on(self.inner.get_by_name(name))
    }

    pub fn get_by_keyword(&self, keyword: Keyword) -> Result<Vec<License>> {
        self.runtime.block_on(self.inner.get_by_keyword(keyword))
    }

    pub fn get_by_steward(&self, steward: &str) -> Result<Vec<License>> {
        self.runtime.block_on(self.inner.get_by_steward(steward))
    }

    pub fn get_by_spdx_pattern(&self, pattern: &str) -> Result<Vec<License>> {
        self.runtime.block_on(self.inner.get_by_spdx_pattern(pattern))
    }

    pub fn initialize(&self) -> Result<()> {
        self.runtime.block_on(self.inner.initialize())
    }

    pub fn close(&self) {
        self.inner.close();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

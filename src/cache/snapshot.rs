//! The license snapshot cache.
//!
//! [`SnapshotCache`] owns the in-memory catalog. It is populated lazily on
//! first demand and then serves every read from the published snapshot.
//!
//! # Population
//!
//! One population runs at a time, behind an async mutex. A caller that finds
//! a non-empty snapshot returns it without taking the gate; callers that
//! queue behind an in-flight population re-check once they hold the gate and
//! reuse its result.
//!
//! A pass runs in four steps:
//!
//! 1. stream the bulk listing into a fresh per-pass map, skipping malformed
//!    records
//! 2. if the stream yielded nothing or was cut short, fetch the listing again
//!    as a single array
//! 3. fetch license text for every record that lacks it, throttled by the
//!    [`ContentFetcher`]
//! 4. replace the catalog records in the key index with the pass map, sort
//!    and publish it as the new snapshot
//!
//! A pass whose catalog fetch fails, or that is cancelled, is never published
//! and leaves the index untouched. Readers get the partial result and the
//! next call starts over. Records merged by filtered fetches stay in the
//! index until a pass returns them from the catalog.
//!
//! # Keys
//!
//! Records are indexed by [`License::index_key()`] folded to lowercase, so
//! key lookups are case-insensitive. The last record seen for a key wins.
//! Every comparison in this module folds case the same way.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use dashmap::{DashMap, DashSet};
use futures_util::StreamExt;
use futures_util::future::join_all;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::CatalogReader;
use crate::content::ContentFetcher;
use crate::telemetry;
use crate::types::{FilterParam, License};
use crate::{LicatError, Result};

/// Result of one population pass.
enum Population {
    /// Published, or found already published.
    Ready(Arc<Vec<License>>),
    /// The catalog could not be fetched completely; `partial` was not published.
    Degraded {
        partial: Arc<Vec<License>>,
        error: LicatError,
    },
    /// Cancelled before completion; `partial` was not published.
    Cancelled(Arc<Vec<License>>),
}

/// Thread-safe, populate-once view of the license catalog.
pub struct SnapshotCache {
    reader: CatalogReader,
    fetcher: ContentFetcher,
    index: DashMap<String, License>,
    /// Keys merged by filtered fetches and not backed by a catalog pass.
    filtered: DashSet<String>,
    snapshot: RwLock<Arc<Vec<License>>>,
    gate: Mutex<()>,
    cache_snapshot: bool,
}

impl SnapshotCache {
    /// Create an empty cache.
    ///
    /// With `cache_snapshot` off every [`get_all()`](Self::get_all) runs a
    /// full population pass instead of reusing the published snapshot.
    pub fn new(reader: CatalogReader, fetcher: ContentFetcher, cache_snapshot: bool) -> Self {
        Self {
            reader,
            fetcher,
            index: DashMap::new(),
            filtered: DashSet::new(),
            snapshot: RwLock::new(Arc::new(Vec::new())),
            gate: Mutex::new(()),
            cache_snapshot,
        }
    }

    pub fn reader(&self) -> &CatalogReader {
        &self.reader
    }

    pub fn fetcher(&self) -> &ContentFetcher {
        &self.fetcher
    }

    /// The last published snapshot (empty before the first population).
    pub fn snapshot(&self) -> Arc<Vec<License>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of records in the key index, including records merged from
    /// filtered fetches.
    pub fn indexed(&self) -> usize {
        self.index.len()
    }

    /// All records, sorted by key.
    ///
    /// Never fails: a failed or cancelled population yields whatever was
    /// gathered, possibly nothing.
    pub async fn get_all(&self, cancel: &CancellationToken) -> Arc<Vec<License>> {
        if let Some(snapshot) = self.published() {
            return snapshot;
        }
        match self.populate(cancel).await {
            Population::Ready(snapshot) => snapshot,
            Population::Degraded { partial, error } => {
                warn!(error = %error, records = partial.len(), "catalog population degraded");
                partial
            }
            Population::Cancelled(partial) => partial,
        }
    }

    /// Populate the cache, failing if the catalog could not be fetched.
    pub async fn initialize(&self, cancel: &CancellationToken) -> Result<()> {
        if self.published().is_some() {
            return Ok(());
        }
        match self.populate(cancel).await {
            Population::Ready(_) => Ok(()),
            Population::Degraded { error, .. } => Err(LicatError::initialization(error)),
            Population::Cancelled(_) => Err(LicatError::Cancelled),
        }
    }

    /// Records whose name or id contains `query`, ignoring case.
    pub async fn search(&self, query: &str, cancel: &CancellationToken) -> Vec<License> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let needle = fold(query);
        self.get_all(cancel)
            .await
            .iter()
            .filter(|l| fold(&l.name).contains(&needle) || fold(&l.id).contains(&needle))
            .cloned()
            .collect()
    }

    /// Look up one record by key (SPDX id or name), ignoring case.
    ///
    /// Falls back to a scan matching `id`, `spdx_id` or `name` when the index
    /// has no entry under `key`.
    pub async fn get_by_key(&self, key: &str, cancel: &CancellationToken) -> Option<License> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        let snapshot = self.get_all(cancel).await;

        let key = fold(key);
        if let Some(entry) = self.index.get(&key) {
            return Some(entry.value().clone());
        }
        snapshot
            .iter()
            .find(|l| {
                fold(&l.id) == key
                    || fold(&l.name) == key
                    || l.spdx_id.as_deref().is_some_and(|spdx| fold(spdx) == key)
            })
            .cloned()
    }

    /// Fetch records filtered server-side, enrich them and merge them into
    /// the index.
    ///
    /// An empty `value` short-circuits without a request. Request and decode
    /// failures yield an empty result.
    pub async fn get_filtered(
        &self,
        param: FilterParam,
        value: &str,
        cancel: &CancellationToken,
    ) -> Vec<License> {
        if value.trim().is_empty() {
            return Vec::new();
        }

        let fetched = tokio::select! {
            result = self.reader.fetch_filtered(param, value) => result,
            _ = cancel.cancelled() => return Vec::new(),
        };
        let licenses = match fetched {
            Ok(licenses) => licenses,
            Err(e) => {
                warn!(filter = %param, value, error = %e, "filtered fetch failed");
                return Vec::new();
            }
        };

        let mut keys = Vec::with_capacity(licenses.len());
        for license in licenses {
            if let Some(key) = self.insert(&self.index, license, true)
                && !keys.contains(&key)
            {
                self.filtered.insert(key.clone());
                keys.push(key);
            }
        }
        self.enrich(&self.index, &keys, cancel).await;

        let mut results: Vec<License> = keys
            .iter()
            .filter_map(|key| self.index.get(key).map(|e| e.value().clone()))
            .collect();
        results.sort_by_cached_key(License::sort_key);
        results
    }

    fn published(&self) -> Option<Arc<Vec<License>>> {
        if !self.cache_snapshot {
            return None;
        }
        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            return None;
        }
        metrics::counter!(telemetry::SNAPSHOT_HITS_TOTAL).increment(1);
        Some(snapshot)
    }

    async fn populate(&self, cancel: &CancellationToken) -> Population {
        let _gate = tokio::select! {
            gate = self.gate.lock() => gate,
            _ = cancel.cancelled() => {
                metrics::counter!(telemetry::POPULATIONS_TOTAL, "outcome" => "cancelled").increment(1);
                return Population::Cancelled(self.snapshot());
            }
        };

        if let Some(snapshot) = self.published() {
            return Population::Ready(snapshot);
        }

        let start = Instant::now();
        let pass = DashMap::new();
        let loaded = tokio::select! {
            result = self.load_catalog(&pass) => Some(result),
            _ = cancel.cancelled() => None,
        };

        match loaded {
            None => {
                metrics::counter!(telemetry::POPULATIONS_TOTAL, "outcome" => "cancelled").increment(1);
                return Population::Cancelled(Arc::new(materialize(&pass)));
            }
            Some(Ok(count)) => {
                debug!(records = count, "catalog loaded");
                let keys: Vec<String> = pass.iter().map(|e| e.key().clone()).collect();
                if !self.enrich(&pass, &keys, cancel).await {
                    metrics::counter!(telemetry::POPULATIONS_TOTAL, "outcome" => "cancelled")
                        .increment(1);
                    return Population::Cancelled(Arc::new(materialize(&pass)));
                }
            }
            Some(Err(error)) => {
                metrics::counter!(telemetry::POPULATIONS_TOTAL, "outcome" => "degraded").increment(1);
                return Population::Degraded {
                    partial: Arc::new(materialize(&pass)),
                    error,
                };
            }
        }

        self.commit(pass);
        let snapshot = Arc::new(materialize(&self.index));
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = snapshot.clone();
        metrics::counter!(telemetry::POPULATIONS_TOTAL, "outcome" => "published").increment(1);
        info!(
            records = snapshot.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "license snapshot published"
        );
        Population::Ready(snapshot)
    }

    /// Fill `pass` from the bulk listing, streaming first and falling back
    /// to a whole-array decode.
    ///
    /// Records streamed before a failure are replaced once the array
    /// fallback succeeds, so a completed `pass` only ever holds one listing.
    /// If both tiers fail, `pass` keeps the streamed records.
    async fn load_catalog(&self, pass: &DashMap<String, License>) -> Result<usize> {
        match self.reader.stream_all().await {
            Ok(mut stream) => {
                let mut count = 0;
                let mut failure = None;
                while let Some(item) = stream.next().await {
                    match item {
                        Ok(license) => {
                            if self.insert(pass, license, self.cache_snapshot).is_some() {
                                count += 1;
                            }
                        }
                        Err(e) => {
                            failure = Some(e);
                            break;
                        }
                    }
                }
                match failure {
                    None if count > 0 => return Ok(count),
                    None => debug!("streamed catalog was empty, retrying as array"),
                    Some(e) => warn!(records = count, error = %e, "catalog stream cut short, retrying as array"),
                }
            }
            Err(e) => warn!(error = %e, "catalog stream failed, retrying as array"),
        }

        let licenses = self.reader.fetch_all().await?;
        pass.clear();
        let mut count = 0;
        for license in licenses {
            if self.insert(pass, license, self.cache_snapshot).is_some() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Insert into `map` under the record's folded key. Returns the key, or
    /// `None` for records that cannot be keyed.
    ///
    /// With `carry`, text already held in the index for the same page is
    /// kept instead of being fetched again.
    fn insert(
        &self,
        map: &DashMap<String, License>,
        mut license: License,
        carry: bool,
    ) -> Option<String> {
        let Some(key) = license.index_key().map(fold) else {
            warn!(id = %license.id, "license has neither spdx id nor name, skipping");
            return None;
        };
        if carry
            && !license.has_license_text()
            && let Some(existing) = self.index.get(&key)
            && existing.html_url() == license.html_url()
        {
            license.license_text = existing.license_text.clone();
        }
        map.insert(key.clone(), license);
        Some(key)
    }

    /// Replace the catalog records in the index with a completed pass.
    ///
    /// Keys the pass did not return are dropped unless a filtered fetch
    /// merged them. In no-cache mode filtered merges are dropped too.
    fn commit(&self, pass: DashMap<String, License>) {
        if !self.cache_snapshot {
            self.filtered.clear();
        }
        self.index
            .retain(|key, _| pass.contains_key(key) || self.filtered.contains(key));
        for (key, license) in pass {
            self.filtered.remove(&key);
            self.index.insert(key, license);
        }
    }

    /// Fetch text for every record of `map` under `keys` that lacks it.
    ///
    /// Returns `false` if cancelled before all fetches finished; fetches
    /// that completed keep their text.
    async fn enrich(
        &self,
        map: &DashMap<String, License>,
        keys: &[String],
        cancel: &CancellationToken,
    ) -> bool {
        let jobs: Vec<(&String, String)> = keys
            .iter()
            .filter_map(|key| {
                let entry = map.get(key)?;
                if entry.has_license_text() {
                    return None;
                }
                let Some(url) = entry.html_url() else {
                    debug!(id = %entry.id, "license has no html link, not enriching");
                    return None;
                };
                Some((key, url.to_string()))
            })
            .collect();
        if jobs.is_empty() {
            return true;
        }

        let total = jobs.len();
        let fetches = jobs.into_iter().map(|(key, url)| async move {
            let text = self.fetcher.fetch(&url).await;
            let status = if text.is_empty() { "empty" } else { "ok" };
            metrics::counter!(telemetry::ENRICHMENTS_TOTAL, "status" => status).increment(1);
            if let Some(mut entry) = map.get_mut(key)
                && entry.license_text.is_empty()
            {
                entry.license_text = text;
            }
        });

        tokio::select! {
            _ = join_all(fetches) => {
                debug!(records = total, "enrichment finished");
                true
            }
            _ = cancel.cancelled() => {
                metrics::counter!(telemetry::ENRICHMENTS_TOTAL, "status" => "cancelled").increment(1);
                warn!(records = total, "enrichment cancelled");
                false
            }
        }
    }

}

fn materialize(map: &DashMap<String, License>) -> Vec<License> {
    let mut all: Vec<License> = map.iter().map(|e| e.value().clone()).collect();
    all.sort_by_cached_key(License::sort_key);
    all
}

fn fold(s: &str) -> String {
    s.to_lowercase()
}

//! In-memory catalog cache
//!
//! Provides:
//! - A single TTL-bound entry holding the last aggregated catalog
//! - Get/set/invalidate operations
//! - Single-flight refresh: the entry lock is held while a refresh runs, so
//!   concurrent callers wait for it and share the result

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use crate::catalog::BookRecord;
use crate::errors::Result;
use crate::metrics;

/// Shared, immutable catalog snapshot
pub type Catalog = Arc<Vec<BookRecord>>;

const CACHE_NAME: &str = "catalog";

/// One cached aggregation
#[derive(Debug, Clone)]
struct CacheEntry {
    timestamp: Instant,
    fetched_at: DateTime<Utc>,
    data: Catalog,
}

impl CacheEntry {
    fn new(data: Catalog) -> Self {
        Self {
            timestamp: Instant::now(),
            fetched_at: Utc::now(),
            data,
        }
    }

    /// Usable without touching disk
    fn is_fresh(&self, ttl: Duration) -> bool {
        !self.data.is_empty() && self.timestamp.elapsed() < ttl
    }
}

/// Point-in-time view of the cache, for readiness checks and the CLI
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub records: usize,
    pub fresh: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
    pub ttl_secs: u64,
}

/// Catalog cache client
#[derive(Debug)]
pub struct CatalogCache {
    ttl: Duration,
    entry: Mutex<Option<CacheEntry>>,
}

impl CatalogCache {
    /// Create an empty cache
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get the cached catalog if it is still fresh
    pub async fn get(&self) -> Option<Catalog> {
        let entry = self.entry.lock().await;
        match entry.as_ref() {
            Some(cached) if cached.is_fresh(self.ttl) => {
                debug!(records = cached.data.len(), "Cache hit");
                Some(cached.data.clone())
            }
            _ => {
                debug!("Cache miss");
                None
            }
        }
    }

    /// Replace the cached catalog, restarting the TTL window
    pub async fn set(&self, data: Catalog) {
        let mut entry = self.entry.lock().await;
        debug!(records = data.len(), ttl_secs = self.ttl.as_secs(), "Cache set");
        *entry = Some(CacheEntry::new(data));
    }

    /// Drop the cached catalog. Returns whether an entry existed.
    pub async fn invalidate(&self) -> bool {
        let existed = self.entry.lock().await.take().is_some();
        debug!(existed, "Cache invalidated");
        existed
    }

    /// Return the fresh entry, or run `loader` and cache its result.
    ///
    /// `force` skips the freshness check. A failed load leaves the previous
    /// entry in place.
    pub async fn get_or_refresh<F, Fut>(&self, force: bool, loader: F) -> Result<Catalog>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<BookRecord>>>,
    {
        let mut entry = self.entry.lock().await;

        if !force {
            if let Some(cached) = entry.as_ref().filter(|cached| cached.is_fresh(self.ttl)) {
                metrics::record_cache(true, CACHE_NAME);
                return Ok(cached.data.clone());
            }
        }
        metrics::record_cache(false, CACHE_NAME);

        let data: Catalog = Arc::new(loader().await?);
        *entry = Some(CacheEntry::new(data.clone()));
        Ok(data)
    }

    /// Describe the current entry without refreshing it
    pub async fn status(&self) -> CacheStatus {
        let entry = self.entry.lock().await;
        match entry.as_ref() {
            Some(cached) => CacheStatus {
                records: cached.data.len(),
                fresh: cached.is_fresh(self.ttl),
                age_secs: Some(cached.timestamp.elapsed().as_secs()),
                fetched_at: Some(cached.fetched_at),
                ttl_secs: self.ttl.as_secs(),
            },
            None => CacheStatus {
                records: 0,
                fresh: false,
                age_secs: None,
                fetched_at: None,
                ttl_secs: self.ttl.as_secs(),
            },
        }
    }
}

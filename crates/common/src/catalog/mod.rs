//! Book catalog aggregation
//!
//! Merges the bundled dataset, the custom list and the CMS directory into a
//! single deduplicated list:
//! 1. Read each source in `SourceKind::MERGE_ORDER`
//! 2. Normalize and classify every entry
//! 3. Drop repeated (driveUrl, title) pairs, keeping the first
//! 4. Serve the result through a TTL cache

pub mod models;
pub mod normalize;
pub mod sources;
pub mod subjects;

pub use models::{BookRecord, SourceKind};
pub use subjects::{classify, classify_label, Subject};

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::cache::{CacheStatus, Catalog, CatalogCache};
use crate::config::CatalogConfig;
use crate::errors::{AppError, Result};
use crate::metrics;

/// Locations of the three sources
#[derive(Debug, Clone)]
pub struct SourcePaths {
    /// Bundled dataset (mandatory)
    pub local_dataset: PathBuf,
    /// Hand-curated list (optional)
    pub custom_list: PathBuf,
    /// Directory of CMS records (optional)
    pub cms_dir: PathBuf,
}

impl SourcePaths {
    /// Read one source
    pub fn read(&self, source: SourceKind) -> Result<Vec<BookRecord>> {
        match source {
            SourceKind::Local => sources::read_local_dataset(&self.local_dataset),
            SourceKind::Custom => Ok(sources::read_custom_list(&self.custom_list)),
            SourceKind::Cms => Ok(sources::read_cms_dir(&self.cms_dir)),
        }
    }
}

/// Keep the first record for each (driveUrl, title) pair
pub fn dedupe(records: Vec<BookRecord>) -> Vec<BookRecord> {
    let before = records.len();
    let mut seen = HashSet::with_capacity(before);
    let kept: Vec<BookRecord> = records
        .into_iter()
        .filter(|record| seen.insert(record.dedupe_key()))
        .collect();

    if kept.len() < before {
        debug!(removed = before - kept.len(), "Removed duplicate records");
    }
    kept
}

/// Aggregate all sources once, without caching
pub fn load_catalog(paths: &SourcePaths) -> Result<Vec<BookRecord>> {
    let mut merged = Vec::new();
    for source in SourceKind::MERGE_ORDER {
        merged.extend(paths.read(source)?);
    }
    Ok(dedupe(merged))
}

/// Process-lifetime catalog service owning the cache
#[derive(Debug)]
pub struct CatalogService {
    paths: SourcePaths,
    cache: CatalogCache,
}

impl CatalogService {
    pub fn new(paths: SourcePaths, ttl: Duration) -> Self {
        Self {
            paths,
            cache: CatalogCache::new(ttl),
        }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(config.source_paths(), config.cache_ttl())
    }

    pub fn paths(&self) -> &SourcePaths {
        &self.paths
    }

    pub fn ttl(&self) -> Duration {
        self.cache.ttl()
    }

    /// The merged catalog, from cache when fresh.
    ///
    /// `force_refresh` re-reads every source even inside the TTL window.
    pub async fn get_catalog(&self, force_refresh: bool) -> Result<Catalog> {
        let paths = self.paths.clone();
        self.cache
            .get_or_refresh(force_refresh, || refresh(paths, force_refresh))
            .await
    }

    /// Look up one record by id
    pub async fn find(&self, id: &str) -> Result<Option<BookRecord>> {
        let catalog = self.get_catalog(false).await?;
        Ok(catalog.iter().find(|record| record.id == id).cloned())
    }

    /// Drop the cached catalog so the next call re-reads the sources
    pub async fn invalidate(&self) -> bool {
        self.cache.invalidate().await
    }

    pub async fn cache_status(&self) -> CacheStatus {
        self.cache.status().await
    }
}

async fn refresh(paths: SourcePaths, forced: bool) -> Result<Vec<BookRecord>> {
    let start = Instant::now();

    let result = tokio::task::spawn_blocking(move || load_catalog(&paths))
        .await
        .map_err(|e| AppError::Internal {
            message: format!("Catalog refresh task failed: {}", e),
        })?;

    let elapsed = start.elapsed();
    match &result {
        Ok(records) => {
            metrics::record_refresh(elapsed.as_secs_f64(), records.len(), true);
            info!(
                records = records.len(),
                forced,
                duration_ms = elapsed.as_millis() as u64,
                "Catalog refreshed"
            );
        }
        Err(_) => metrics::record_refresh(elapsed.as_secs_f64(), 0, false),
    }
    result
}

/// Shared handle used by servers
pub type SharedCatalog = Arc<CatalogService>;

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, url: &str, source: SourceKind, description: &str) -> BookRecord {
        BookRecord {
            id: normalize::derive_id(url),
            title: title.to_string(),
            description: description.to_string(),
            category: "General".to_string(),
            drive_url: url.to_string(),
            author: None,
            cover: String::new(),
            source,
        }
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let records = vec![
            record("Let Us C", "https://a.org/c.pdf", SourceKind::Local, "first"),
            record("Let Us C", "https://a.org/c.pdf", SourceKind::Custom, "second"),
            record("Let Us C", "https://a.org/c2.pdf", SourceKind::Cms, "other url"),
            record("Let Us C++", "https://a.org/c.pdf", SourceKind::Cms, "other title"),
        ];

        let kept = dedupe(records);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].description, "first");
        assert_eq!(kept[0].source, SourceKind::Local);
    }

    #[test]
    fn test_dedupe_key_separates_fields() {
        let a = record("bc", "https://a.org/a", SourceKind::Local, "");
        let b = record("c", "https://a.org/ab", SourceKind::Local, "");
        assert_ne!(a.dedupe_key(), b.dedupe_key());
    }
}

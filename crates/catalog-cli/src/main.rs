//! StudyShelf catalog smoke test
//!
//! Runs one aggregation through the same service the gateway uses and prints
//! a JSON summary to stdout. Logs go to stderr.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use studyshelf_common::{
    catalog::{BookRecord, CatalogService, SourceKind},
    config::AppConfig,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "catalog-smoke", version, about = "Aggregate the book catalog once and print a summary")]
struct Cli {
    /// Bypass the cache and re-read every source
    #[arg(long)]
    force: bool,

    /// Config file to use instead of the layered config/ directory
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of records in each sample
    #[arg(long, default_value_t = 5)]
    sample: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary<'a> {
    total: usize,
    by_source: BTreeMap<SourceKind, usize>,
    sample: Vec<&'a BookRecord>,
    cms_sample: Vec<&'a BookRecord>,
    fetched_at: Option<DateTime<Utc>>,
}

fn summarize(records: &[BookRecord], sample: usize, fetched_at: Option<DateTime<Utc>>) -> Summary<'_> {
    let mut by_source = BTreeMap::new();
    for record in records {
        *by_source.entry(record.source).or_insert(0) += 1;
    }

    Summary {
        total: records.len(),
        by_source,
        sample: records.iter().take(sample).collect(),
        cms_sample: records
            .iter()
            .filter(|r| r.source == SourceKind::Cms)
            .take(sample)
            .collect(),
        fetched_at,
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    match path {
        Some(path) => {
            let path = path.to_string_lossy();
            AppConfig::from_file(&path).with_context(|| format!("Failed to read config from {}", path))
        }
        None => AppConfig::load().context("Failed to load configuration"),
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;
    init_tracing(&config.observability.log_level);

    let service = CatalogService::from_config(&config.catalog);
    info!(
        dataset = %service.paths().local_dataset.display(),
        force = cli.force,
        "Aggregating catalog"
    );

    let catalog = service
        .get_catalog(cli.force)
        .await
        .context("Catalog aggregation failed")?;
    let status = service.cache_status().await;

    let summary = summarize(&catalog, cli.sample, status.fetched_at);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, source: SourceKind) -> BookRecord {
        BookRecord {
            id: format!("id-{}", title),
            title: title.to_string(),
            description: String::new(),
            category: "General".to_string(),
            drive_url: format!("https://example.org/{}.pdf", title),
            author: None,
            cover: String::new(),
            source,
        }
    }

    #[test]
    fn test_summary_counts_by_source() {
        let records = vec![
            record("a", SourceKind::Local),
            record("b", SourceKind::Local),
            record("c", SourceKind::Custom),
            record("d", SourceKind::Cms),
            record("e", SourceKind::Cms),
        ];

        let summary = summarize(&records, 1, None);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.by_source[&SourceKind::Local], 2);
        assert_eq!(summary.by_source[&SourceKind::Cms], 2);
        assert_eq!(summary.sample.len(), 1);
        assert_eq!(summary.cms_sample[0].title, "d");
    }

    #[test]
    fn test_summary_json_shape() {
        let records = vec![record("a", SourceKind::Custom)];
        let json = serde_json::to_value(summarize(&records, 5, None)).unwrap();

        assert_eq!(json["total"], 1);
        assert_eq!(json["bySource"]["custom"], 1);
        assert!(json["bySource"].get("local").is_none());
        assert_eq!(json["cmsSample"].as_array().unwrap().len(), 0);
        assert!(json["fetchedAt"].is_null());
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from(["catalog-smoke", "--force", "--sample", "3"]);
        assert!(cli.force);
        assert_eq!(cli.sample, 3);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smoke.toml");
        std::fs::write(&path, "[catalog]\nroot_dir = \"/srv/books\"\ncache_ttl_secs = 5\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.catalog.cache_ttl_secs, 5);
        assert_eq!(config.catalog.root_dir, PathBuf::from("/srv/books"));
    }
}

//! StudyShelf Common Library
//!
//! Shared code for the StudyShelf catalog binaries including:
//! - Catalog aggregation (sources, normalization, subject classification)
//! - In-memory catalog cache
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod cache;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use catalog::{BookRecord, CatalogService, SourceKind, SourcePaths};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Category used when neither classification nor the source provides one
pub const DEFAULT_CATEGORY: &str = "General";

/// Description used when the source has none
pub const DEFAULT_DESCRIPTION: &str = "No description available.";

//! Catalog handlers

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use studyshelf_common::{
    catalog::{BookRecord, SourceKind},
    errors::{AppError, Result},
};

use crate::AppState;

/// Query parameters for `GET /api/books`
#[derive(Debug, Default, Deserialize)]
pub struct BooksQuery {
    /// `1`/`true` bypasses the cache
    pub revalidate: Option<String>,
    /// Alias of `revalidate`
    pub force: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
    pub q: Option<String>,
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl BooksQuery {
    pub fn force_refresh(&self) -> bool {
        [&self.revalidate, &self.force]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .any(is_truthy)
    }

    fn source_filter(&self) -> Result<Option<SourceKind>> {
        non_blank(&self.source)
            .map(|s| s.parse::<SourceKind>())
            .transpose()
            .map_err(|message| AppError::Validation {
                message,
                field: Some("source".to_string()),
            })
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

fn cache_control(state: &AppState, forced: bool) -> String {
    if forced {
        "no-store".to_string()
    } else {
        format!("public, max-age={}", state.catalog.ttl().as_secs())
    }
}

/// List the catalog, optionally filtered
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BooksQuery>,
) -> Result<Response> {
    let forced = query.force_refresh();
    let source = query.source_filter()?;
    let category = non_blank(&query.category);
    let needle = non_blank(&query.q).map(str::to_lowercase);

    let catalog = state.catalog.get_catalog(forced).await?;

    let books: Vec<&BookRecord> = catalog
        .iter()
        .filter(|book| source.map_or(true, |s| book.source == s))
        .filter(|book| category.map_or(true, |c| book.category.eq_ignore_ascii_case(c)))
        .filter(|book| needle.as_deref().map_or(true, |n| book.matches_query(n)))
        .collect();

    tracing::debug!(
        total = catalog.len(),
        returned = books.len(),
        forced,
        "Catalog listed"
    );

    Ok((
        [(header::CACHE_CONTROL, cache_control(&state, forced))],
        Json(books),
    )
        .into_response())
}

/// Get one book by id
pub async fn get_book(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    let book = state
        .catalog
        .find(&id)
        .await?
        .ok_or_else(|| AppError::BookNotFound { id: id.clone() })?;

    Ok((
        [(header::CACHE_CONTROL, cache_control(&state, false))],
        Json(book),
    )
        .into_response())
}

/// Category labels with their record counts, largest first
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryCount>>> {
    let catalog = state.catalog.get_catalog(false).await?;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for book in catalog.iter() {
        *counts.entry(book.category.as_str()).or_default() += 1;
    }

    let mut categories: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    categories.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));

    Ok(Json(categories))
}

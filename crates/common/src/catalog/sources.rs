//! Readers for the three catalog sources
//!
//! The bundled dataset is mandatory and its errors propagate. The custom list
//! and the CMS directory are optional: anything unreadable is logged and
//! skipped.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::models::{BookRecord, FlatEntry, LocalVolume, SourceKind};
use super::normalize::{clean_cover, derive_id, non_empty, unwrap_search_url};
use super::subjects::classify_label;
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::{DEFAULT_CATEGORY, DEFAULT_DESCRIPTION};

/// Map one dataset volume. Returns `None` when title or link is missing.
pub fn map_local(volume: &LocalVolume) -> Option<BookRecord> {
    let info = &volume.volume_info;
    let title = non_empty(info.title.as_deref())?;
    let drive_url = non_empty(volume.raw_link().map(unwrap_search_url).as_deref())?;

    let category = classify_label(&title)
        .map(str::to_string)
        .or_else(|| info.categories.iter().find_map(|c| non_empty(Some(c.as_str()))))
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    let authors: Vec<&str> = info
        .authors
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect();

    Some(BookRecord {
        id: derive_id(&drive_url),
        description: non_empty(info.description.as_deref())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        category,
        author: (!authors.is_empty()).then(|| authors.join(", ")),
        cover: clean_cover(volume.thumbnail()),
        source: SourceKind::Local,
        title,
        drive_url,
    })
}

/// Map one custom-list or CMS entry. Classification overrides `category`.
pub fn map_flat(entry: &FlatEntry, source: SourceKind) -> Option<BookRecord> {
    let title = non_empty(entry.title.as_deref())?;
    let drive_url = non_empty(entry.raw_link().map(unwrap_search_url).as_deref())?;

    let category = classify_label(&title)
        .map(str::to_string)
        .or_else(|| non_empty(entry.category.as_deref()))
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    Some(BookRecord {
        id: derive_id(&drive_url),
        description: non_empty(entry.description.as_deref())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        category,
        author: non_empty(entry.author.as_deref()),
        cover: clean_cover(entry.cover.as_deref()),
        source,
        title,
        drive_url,
    })
}

/// Deserialize each array element on its own so one bad item is not fatal
fn decode_items<T: DeserializeOwned>(items: Vec<Value>, source: SourceKind) -> Vec<T> {
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                debug!(source = %source, index, error = %e, "Skipping malformed item");
                None
            }
        })
        .collect();

    let skipped = total - decoded.len();
    if skipped > 0 {
        metrics::record_skipped(source, skipped);
    }
    decoded
}

fn map_all<T>(
    items: &[T],
    source: SourceKind,
    map: impl Fn(&T) -> Option<BookRecord>,
) -> Vec<BookRecord> {
    let records: Vec<BookRecord> = items.iter().filter_map(map).collect();
    let dropped = items.len() - records.len();
    if dropped > 0 {
        debug!(source = %source, dropped, "Dropped entries without title or link");
        metrics::record_skipped(source, dropped);
    }
    records
}

/// Read the bundled dataset. Missing file or invalid JSON is an error.
pub fn read_local_dataset(path: &Path) -> Result<Vec<BookRecord>> {
    let raw = fs::read_to_string(path).map_err(|source| AppError::DatasetUnavailable {
        path: path.display().to_string(),
        source,
    })?;

    let items: Vec<Value> = serde_json::from_str(&raw).map_err(|source| AppError::DatasetInvalid {
        path: path.display().to_string(),
        source,
    })?;

    let volumes: Vec<LocalVolume> = decode_items(items, SourceKind::Local);
    let records = map_all(&volumes, SourceKind::Local, map_local);

    debug!(path = %path.display(), count = records.len(), "Loaded local dataset");
    Ok(records)
}

/// Read the hand-curated list. Any failure yields an empty list.
pub fn read_custom_list(path: &Path) -> Vec<BookRecord> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No custom list, skipping");
            return Vec::new();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read custom list, skipping");
            return Vec::new();
        }
    };

    let items: Vec<Value> = match serde_json::from_str(&raw) {
        Ok(items) => items,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Custom list is not a JSON array, skipping");
            return Vec::new();
        }
    };

    let entries: Vec<FlatEntry> = decode_items(items, SourceKind::Custom);
    let records = map_all(&entries, SourceKind::Custom, |e| map_flat(e, SourceKind::Custom));

    debug!(path = %path.display(), count = records.len(), "Loaded custom list");
    records
}

fn read_cms_file(path: &Path) -> std::result::Result<FlatEntry, String> {
    let raw = fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&raw).map_err(|e| e.to_string())
}

/// Read every `*.json` file directly inside `dir`, in file-name order.
/// A missing directory or an unreadable file is skipped.
pub fn read_cms_dir(dir: &Path) -> Vec<BookRecord> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "No CMS directory, skipping");
        return Vec::new();
    }

    let mut entries = Vec::new();
    let mut failed = 0usize;

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to list CMS entry, skipping");
                failed += 1;
                continue;
            }
        };

        let path = entry.path();
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if !entry.file_type().is_file() || !is_json {
            continue;
        }

        match read_cms_file(path) {
            Ok(parsed) => entries.push(parsed),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Skipping unreadable CMS file");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        metrics::record_skipped(SourceKind::Cms, failed);
    }

    let records = map_all(&entries, SourceKind::Cms, |e| map_flat(e, SourceKind::Cms));
    debug!(dir = %dir.display(), count = records.len(), failed, "Loaded CMS directory");
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn local(value: Value) -> LocalVolume {
        serde_json::from_value(value).unwrap()
    }

    fn flat(value: Value) -> FlatEntry {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_map_local_classifies_before_listed_category() {
        let record = map_local(&local(json!({
            "volumeInfo": {
                "title": "Computer Networks: A Top-Down Approach",
                "description": "Kurose & Ross",
                "categories": ["Computers"],
                "authors": ["James Kurose", "Keith Ross"]
            },
            "downloadLink": "https://drive.google.com/file/d/cn/view"
        })))
        .unwrap();

        assert_eq!(record.category, "Computer Networks");
        assert_eq!(record.author.as_deref(), Some("James Kurose, Keith Ross"));
        assert_eq!(record.source, SourceKind::Local);
        assert_eq!(record.id, derive_id("https://drive.google.com/file/d/cn/view"));
    }

    #[test]
    fn test_map_local_falls_back_to_listed_then_default_category() {
        let listed = map_local(&local(json!({
            "volumeInfo": { "title": "Engineering Mechanics", "categories": ["", "Mechanical"] },
            "solutionLink2": "https://example.org/em.pdf"
        })))
        .unwrap();
        assert_eq!(listed.category, "Mechanical");
        assert_eq!(listed.description, DEFAULT_DESCRIPTION);

        let default = map_local(&local(json!({
            "volumeInfo": { "title": "Engineering Mechanics" },
            "solutionLink": "https://example.org/em.pdf"
        })))
        .unwrap();
        assert_eq!(default.category, DEFAULT_CATEGORY);
    }

    #[test]
    fn test_map_local_requires_title_and_link() {
        assert!(map_local(&local(json!({
            "volumeInfo": { "title": "  " },
            "downloadLink": "https://example.org/a.pdf"
        })))
        .is_none());
        assert!(map_local(&local(json!({ "volumeInfo": { "title": "Operating Systems" } }))).is_none());
    }

    #[test]
    fn test_map_flat_classification_overrides_category() {
        let record = map_flat(
            &flat(json!({
                "title": "Database System Concepts",
                "category": "Misc",
                "link": "https://www.google.com/url?q=https://drive.google.com/file/d/db/view",
                "cover": "/uploads/db.png"
            })),
            SourceKind::Custom,
        )
        .unwrap();

        assert_eq!(record.category, "DBMS");
        assert_eq!(record.drive_url, "https://drive.google.com/file/d/db/view");
        assert_eq!(record.cover, "");
        assert_eq!(record.source, SourceKind::Custom);
    }

    #[test]
    fn test_map_flat_keeps_explicit_category_when_unclassified() {
        let record = map_flat(
            &flat(json!({
                "title": "Engineering Drawing",
                "category": "Mechanical",
                "driveUrl": "https://example.org/ed.pdf",
                "author": " N. D. Bhatt "
            })),
            SourceKind::Cms,
        )
        .unwrap();
        assert_eq!(record.category, "Mechanical");
        assert_eq!(record.author.as_deref(), Some("N. D. Bhatt"));
    }

    #[test]
    fn test_missing_optional_sources_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_custom_list(&dir.path().join("absent.json")).is_empty());
        assert!(read_cms_dir(&dir.path().join("absent")).is_empty());
    }

    #[test]
    fn test_invalid_custom_list_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(read_custom_list(&path).is_empty());
    }

    #[test]
    fn test_custom_list_skips_malformed_items_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        fs::write(
            &path,
            json!([
                { "title": 42, "link": "https://example.org/bad.pdf" },
                { "title": "Let Us C", "link": "https://example.org/c.pdf" },
                { "title": "No Link" }
            ])
            .to_string(),
        )
        .unwrap();

        let records = read_custom_list(&path);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Let Us C");
    }

    #[test]
    fn test_local_dataset_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = read_local_dataset(&dir.path().join("books.json"));
        assert!(matches!(missing, Err(AppError::DatasetUnavailable { .. })));

        let path = dir.path().join("broken.json");
        fs::write(&path, "[{").unwrap();
        assert!(matches!(read_local_dataset(&path), Err(AppError::DatasetInvalid { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_cms_dir_follows_symlinked_records() {
        let dir = tempfile::tempdir().unwrap();
        let shared = dir.path().join("shared");
        let cms = dir.path().join("cms");
        fs::create_dir_all(&shared).unwrap();
        fs::create_dir_all(&cms).unwrap();
        fs::write(
            shared.join("cd.json"),
            json!({ "title": "Compiler Design", "link": "https://example.org/cd.pdf" }).to_string(),
        )
        .unwrap();
        std::os::unix::fs::symlink(shared.join("cd.json"), cms.join("cd.json")).unwrap();

        let records = read_cms_dir(&cms);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Compiler Design");
    }

    #[test]
    fn test_cms_dir_ignores_non_json_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.json"),
            json!({ "title": "Compiler Design", "link": "https://example.org/cd.pdf" }).to_string(),
        )
        .unwrap();
        fs::write(dir.path().join("notes.md"), "# not a record").unwrap();
        fs::create_dir(dir.path().join("nested.json")).unwrap();

        let records = read_cms_dir(dir.path());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].category, "Compiler Design");
        assert_eq!(records[0].source, SourceKind::Cms);
    }
}

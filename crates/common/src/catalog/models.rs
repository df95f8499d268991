//! Catalog record types and the raw shapes read from each source

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a record came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Local,
    Custom,
    Cms,
}

impl SourceKind {
    /// Merge order. Earlier sources win deduplication.
    pub const MERGE_ORDER: [SourceKind; 3] = [SourceKind::Local, SourceKind::Custom, SourceKind::Cms];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Local => "local",
            SourceKind::Custom => "custom",
            SourceKind::Cms => "cms",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(SourceKind::Local),
            "custom" => Ok(SourceKind::Custom),
            "cms" => Ok(SourceKind::Cms),
            other => Err(format!("unknown source '{}'", other)),
        }
    }
}

/// A normalized catalog entry as served to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    /// Content-addressed id derived from `drive_url`
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Canonical download link
    pub drive_url: String,
    pub author: Option<String>,
    /// Absolute image URL, or empty
    pub cover: String,
    pub source: SourceKind,
}

impl BookRecord {
    /// Key used to drop repeated entries across sources
    pub fn dedupe_key(&self) -> String {
        super::normalize::dedupe_key(&self.drive_url, &self.title)
    }

    /// Case-insensitive match over title, author and description
    pub fn matches_query(&self, needle_lower: &str) -> bool {
        self.title.to_lowercase().contains(needle_lower)
            || self.description.to_lowercase().contains(needle_lower)
            || self
                .author
                .as_deref()
                .map(|a| a.to_lowercase().contains(needle_lower))
                .unwrap_or(false)
    }
}

/// One item of the bundled dataset (Google Books volume shape)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalVolume {
    #[serde(default, deserialize_with = "null_as_default")]
    pub volume_info: VolumeInfo,
    pub download_link: Option<String>,
    pub solution_link: Option<String>,
    pub solution_link2: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub authors: Vec<String>,
    #[serde(default)]
    pub image_links: Option<ImageLinks>,
}

/// Exported datasets write `null` for absent lists
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageLinks {
    pub thumbnail: Option<String>,
    #[serde(rename = "smallThumbnail")]
    pub small_thumbnail: Option<String>,
}

impl LocalVolume {
    /// First non-empty of downloadLink, solutionLink, solutionLink2
    pub fn raw_link(&self) -> Option<&str> {
        [&self.download_link, &self.solution_link, &self.solution_link2]
            .into_iter()
            .filter_map(|link| link.as_deref())
            .map(str::trim)
            .find(|link| !link.is_empty())
    }

    pub fn thumbnail(&self) -> Option<&str> {
        self.volume_info
            .image_links
            .as_ref()
            .and_then(|links| links.thumbnail.as_deref().or(links.small_thumbnail.as_deref()))
    }
}

/// Flat record shape shared by the custom list and CMS files
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatEntry {
    pub title: Option<String>,
    pub author: Option<String>,
    pub link: Option<String>,
    pub drive_url: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub cover: Option<String>,
}

impl FlatEntry {
    /// `link` takes priority over `driveUrl`
    pub fn raw_link(&self) -> Option<&str> {
        [&self.link, &self.drive_url]
            .into_iter()
            .filter_map(|link| link.as_deref())
            .map(str::trim)
            .find(|link| !link.is_empty())
    }
}

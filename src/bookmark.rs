use crate::extractor::ScrapedMetadata;
use serde::{Deserialize, Serialize};

/// Bookmark metadata with normalized naming: `thumbnail` and `icon` replace the
/// extractor's `image` and `logo`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookmarkMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl From<ScrapedMetadata> for BookmarkMetadata {
    fn from(scraped: ScrapedMetadata) -> Self {
        Self {
            url: scraped.url,
            title: scraped.title,
            description: scraped.description,
            author: scraped.author,
            publisher: scraped.publisher,
            thumbnail: scraped.image,
            icon: scraped.logo,
        }
    }
}

/// Generic link preview. Serializes with `"type": "bookmark"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "bookmark")]
pub struct Bookmark {
    pub url: String,
    pub metadata: BookmarkMetadata,
}

impl Bookmark {
    /// Builds a bookmark for `url`, or `None` unless both a title and a
    /// description were found.
    pub fn from_scraped(url: &str, scraped: ScrapedMetadata) -> Option<Self> {
        let metadata = BookmarkMetadata::from(scraped);
        let present = |field: &Option<String>| field.as_deref().is_some_and(|s| !s.is_empty());

        if !(present(&metadata.title) && present(&metadata.description)) {
            return None;
        }

        Some(Self {
            url: url.to_string(),
            metadata,
        })
    }
}

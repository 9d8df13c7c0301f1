use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod bookmark;
mod error;
mod extractor;
mod fetcher;
mod logging;
mod oembed;
mod oembed_client;
mod providers;
mod resolver;
mod security;
mod utils;

pub use bookmark::{Bookmark, BookmarkMetadata};
pub use error::ResolveError;
pub use extractor::{HtmlMetadataExtractor, MetadataExtractor, ScrapedMetadata};
pub use fetcher::{ExternalFetch, FetchOptions, FetchResponse, Fetcher, FetcherConfig};
pub use logging::{log_error_card, log_resolution_card};
#[cfg(feature = "logging")]
pub use logging::{setup_logging, LogConfig, LogLevelGuard};
pub use oembed::{
    find_discovery_link, project, sanitize, Dimension, OembedData, OembedType, KNOWN_FIELDS,
};
pub use oembed_client::{ExtractParams, KnownProviderExtractor, OembedClient};
pub use providers::{find_provider, Endpoint, Provider, ProviderMatch, ProviderRegistry, StaticRegistry};
pub use resolver::{OembedResolver, ResolverConfig, DISCOVERY_TIMEOUT, MAX_EMBED_WIDTH};
pub use security::is_unsafe;
pub use utils::truncate_str;

/// The preview kind a caller asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedType {
    /// Scrape page metadata only.
    Bookmark,
    /// oEmbed only, with no bookmark fallback.
    Embed,
}

impl RequestedType {
    /// `"bookmark"` selects a bookmark; any other explicit type means oEmbed only.
    pub fn parse(s: &str) -> Self {
        if s == "bookmark" {
            RequestedType::Bookmark
        } else {
            RequestedType::Embed
        }
    }
}

/// A resolved preview. Each variant serializes with its own `"type"` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Resolution {
    Embed(OembedData),
    Bookmark(Bookmark),
}

impl Resolution {
    pub fn type_name(&self) -> &'static str {
        match self {
            Resolution::Embed(data) => data.kind.as_str(),
            Resolution::Bookmark(_) => "bookmark",
        }
    }
}

#[async_trait]
pub trait PreviewResolver {
    async fn resolve(
        &self,
        url: &str,
        requested: Option<RequestedType>,
    ) -> Result<Resolution, ResolveError>;
}

use crate::fetcher::{ExternalFetch, FetchOptions};
use crate::oembed::{project, OembedData};
use crate::providers::Provider;
use crate::resolver::MAX_EMBED_WIDTH;
use crate::ResolveError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractParams {
    pub max_width: u32,
}

impl Default for ExtractParams {
    fn default() -> Self {
        Self {
            max_width: MAX_EMBED_WIDTH,
        }
    }
}

/// Fetches oEmbed data for a URL that a registry entry is known to serve.
#[async_trait]
pub trait KnownProviderExtractor: Send + Sync {
    async fn extract(
        &self,
        url: &str,
        provider: &Provider,
        params: &ExtractParams,
    ) -> Result<OembedData, ResolveError>;
}

/// Calls the provider's published oEmbed endpoint.
#[derive(Clone)]
pub struct OembedClient {
    fetcher: Arc<dyn ExternalFetch>,
    timeout: Option<Duration>,
}

impl OembedClient {
    pub fn new(fetcher: Arc<dyn ExternalFetch>) -> Self {
        Self {
            fetcher,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Endpoint URL with `{format}` substituted and the `url`, `format` and
    /// `maxwidth` query parameters appended.
    pub fn endpoint_url(
        url: &str,
        provider: &Provider,
        params: &ExtractParams,
    ) -> Result<String, ResolveError> {
        let endpoint = provider.endpoint_for(url).ok_or_else(|| {
            ResolveError::UpstreamError(format!(
                "{} has no endpoint for {url}",
                provider.provider_name
            ))
        })?;

        let mut request_url = Url::parse(&endpoint.url.replace("{format}", "json"))?;
        request_url
            .query_pairs_mut()
            .append_pair("url", url)
            .append_pair("format", "json")
            .append_pair("maxwidth", &params.max_width.to_string());

        Ok(request_url.into())
    }
}

#[async_trait]
impl KnownProviderExtractor for OembedClient {
    #[instrument(level = "debug", skip(self, provider), fields(provider = %provider.provider_name), err)]
    async fn extract(
        &self,
        url: &str,
        provider: &Provider,
        params: &ExtractParams,
    ) -> Result<OembedData, ResolveError> {
        let endpoint = Self::endpoint_url(url, provider, params)?;
        debug!(endpoint = %endpoint, "Requesting provider oEmbed endpoint");

        let mut options = FetchOptions::get().json();
        if let Some(timeout) = self.timeout {
            options = options.with_timeout(timeout);
        }

        let body = self.fetcher.fetch(&endpoint, &options).await?.json()?;

        project(&body).ok_or_else(|| {
            ResolveError::UpstreamError(format!(
                "{} returned an invalid oEmbed response",
                provider.provider_name
            ))
        })
    }
}

use crate::bookmark::Bookmark;
use crate::extractor::{HtmlMetadataExtractor, MetadataExtractor};
use crate::fetcher::{ExternalFetch, FetchOptions, Fetcher};
use crate::oembed::{self, OembedData};
use crate::oembed_client::{ExtractParams, KnownProviderExtractor, OembedClient};
use crate::providers::{find_provider, Provider, ProviderMatch, ProviderRegistry};
use crate::security::is_unsafe;
use crate::{PreviewResolver, RequestedType, Resolution, ResolveError};
use async_trait::async_trait;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(2);
pub const MAX_EMBED_WIDTH: u32 = 1280;

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Timeout for the exploratory page fetch and the discovery-link fetch.
    pub discovery_timeout: Duration,
    /// `maxwidth` hint sent to known providers.
    pub max_width: u32,
    /// Deadline for one whole `resolve` call.
    pub request_deadline: Option<Duration>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            discovery_timeout: DISCOVERY_TIMEOUT,
            max_width: MAX_EMBED_WIDTH,
            request_deadline: None,
        }
    }
}

impl ResolverConfig {
    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    pub fn with_max_width(mut self, max_width: u32) -> Self {
        self.max_width = max_width;
        self
    }

    pub fn with_request_deadline(mut self, deadline: Duration) -> Self {
        self.request_deadline = Some(deadline);
        self
    }
}

/// Resolution steps, tried in order until one yields a preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Oembed,
    Bookmark,
}

impl Strategy {
    fn plan(requested: Option<RequestedType>) -> &'static [Strategy] {
        match requested {
            Some(RequestedType::Bookmark) => &[Strategy::Bookmark],
            Some(RequestedType::Embed) => &[Strategy::Oembed],
            None => &[Strategy::Oembed, Strategy::Bookmark],
        }
    }
}

/// Turns a user-supplied URL into an oEmbed or bookmark preview.
///
/// Holds no per-request state; one instance can serve concurrent requests.
#[derive(Clone)]
pub struct OembedResolver {
    fetcher: Arc<dyn ExternalFetch>,
    registry: Arc<dyn ProviderRegistry>,
    known_provider: Arc<dyn KnownProviderExtractor>,
    extractor: Arc<dyn MetadataExtractor>,
    config: ResolverConfig,
}

impl OembedResolver {
    /// Resolver backed by the default reqwest [`Fetcher`].
    pub fn new(registry: Arc<dyn ProviderRegistry>) -> Result<Self, ResolveError> {
        let fetcher: Arc<dyn ExternalFetch> = Arc::new(Fetcher::new()?);
        Ok(Self::with_fetcher(registry, fetcher, ResolverConfig::default()))
    }

    pub fn with_fetcher(
        registry: Arc<dyn ProviderRegistry>,
        fetcher: Arc<dyn ExternalFetch>,
        config: ResolverConfig,
    ) -> Self {
        let known_provider = Arc::new(OembedClient::new(Arc::clone(&fetcher)));
        Self::with_components(
            registry,
            fetcher,
            known_provider,
            Arc::new(HtmlMetadataExtractor::new()),
            config,
        )
    }

    pub fn with_components(
        registry: Arc<dyn ProviderRegistry>,
        fetcher: Arc<dyn ExternalFetch>,
        known_provider: Arc<dyn KnownProviderExtractor>,
        extractor: Arc<dyn MetadataExtractor>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            fetcher,
            registry,
            known_provider,
            extractor,
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn find_provider(&self, url: &str) -> ProviderMatch {
        find_provider(self.registry.as_ref(), url)
    }

    async fn from_known_provider(
        &self,
        url: &str,
        provider: &Provider,
    ) -> Result<OembedData, ResolveError> {
        let params = ExtractParams {
            max_width: self.config.max_width,
        };

        self.known_provider
            .extract(url, provider, &params)
            .await
            .map_err(|e| {
                let err = ResolveError::UpstreamError(e.to_string());
                err.log();
                err
            })
    }

    /// Fetches oEmbed data for `url`.
    ///
    /// `Ok(None)` means no oEmbed data was found and a bookmark may be tried.
    /// Unsafe URLs fail with `UnknownProvider`, whether given as input, reached
    /// by a redirect or named by the discovery link; a failing known-provider request fails with
    /// `UpstreamError`. Every other fetch or parse problem yields `Ok(None)`.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_oembed(&self, url: &str) -> Result<Option<OembedData>, ResolveError> {
        if is_unsafe(url) {
            warn!(url = %url, "Refusing to resolve unsafe URL");
            return Err(ResolveError::unknown_provider(url));
        }

        let found = self.find_provider(url);
        if let Some(provider) = &found.provider {
            return self.from_known_provider(&found.url, provider).await.map(Some);
        }

        let options = FetchOptions::get().with_timeout(self.config.discovery_timeout);
        let page = match self.fetcher.fetch(url, &options).await {
            Ok(page) => page,
            Err(e) => {
                debug!(url = %url, error = %e, "Exploratory fetch failed");
                return Ok(None);
            }
        };

        if is_redirected(url, &page.url) {
            ensure_safe_redirect(url, &page.url)?;

            let found = self.find_provider(&page.url);
            if let Some(provider) = &found.provider {
                debug!(from = %url, to = %found.url, "Redirected to known provider");
                return self.from_known_provider(&found.url, provider).await.map(Some);
            }
        }

        let oembed_url = match oembed::find_discovery_link(&page.body, &page.url) {
            Some(link) => link,
            None => {
                debug!(url = %page.url, "No oEmbed discovery link");
                return Ok(None);
            }
        };

        if is_unsafe(&oembed_url) {
            warn!(url = %url, discovery = %oembed_url, "Discovery link points at unsafe URL");
            return Err(ResolveError::unknown_provider(oembed_url));
        }

        let options = FetchOptions::get()
            .json()
            .with_timeout(self.config.discovery_timeout);
        let response = match self.fetcher.fetch(&oembed_url, &options).await {
            Ok(response) => response,
            Err(e) => {
                debug!(discovery = %oembed_url, error = %e, "Discovery fetch failed");
                return Ok(None);
            }
        };
        ensure_safe_redirect(&oembed_url, &response.url)?;

        let body = match response.json() {
            Ok(body) => body,
            Err(e) => {
                debug!(discovery = %oembed_url, error = %e, "Discovery response is not JSON");
                return Ok(None);
            }
        };

        let data = oembed::sanitize(&body);
        if data.is_none() {
            debug!(discovery = %oembed_url, "Discovery response is not usable oEmbed");
        }
        Ok(data)
    }

    /// Scrapes a bookmark preview for `url`, fetching the page unless `html`
    /// is supplied. `Ok(None)` when title or description is missing.
    #[instrument(level = "debug", skip(self, html))]
    pub async fn fetch_bookmark(
        &self,
        url: &str,
        html: Option<&str>,
    ) -> Result<Option<Bookmark>, ResolveError> {
        let html = match html {
            Some(html) => Cow::Borrowed(html),
            None => {
                if is_unsafe(url) {
                    warn!(url = %url, "Refusing to scrape unsafe URL");
                    return Err(ResolveError::unknown_provider(url));
                }
                let page = self
                    .fetcher
                    .fetch(url, &FetchOptions::get())
                    .await
                    .map_err(|e| ResolveError::UpstreamError(e.to_string()))?;
                ensure_safe_redirect(url, &page.url)?;
                Cow::Owned(page.body)
            }
        };

        let scraped = self
            .extractor
            .extract(&html, url)
            .map_err(|e| ResolveError::UpstreamError(e.to_string()))?;

        let bookmark = Bookmark::from_scraped(url, scraped);
        if bookmark.is_none() {
            debug!(url = %url, "Page lacks title or description for a bookmark");
        }
        Ok(bookmark)
    }

    async fn attempt(
        &self,
        strategy: Strategy,
        url: &str,
    ) -> Result<Option<Resolution>, ResolveError> {
        match strategy {
            Strategy::Oembed => Ok(self.fetch_oembed(url).await?.map(Resolution::Embed)),
            Strategy::Bookmark => Ok(self
                .fetch_bookmark(url, None)
                .await?
                .map(Resolution::Bookmark)),
        }
    }

    async fn run(
        &self,
        url: &str,
        requested: Option<RequestedType>,
    ) -> Result<Option<Resolution>, ResolveError> {
        for &strategy in Strategy::plan(requested) {
            if let Some(resolution) = self.attempt(strategy, url).await? {
                debug!(url = %url, strategy = ?strategy, "Resolved");
                return Ok(Some(resolution));
            }
        }
        Ok(None)
    }

    /// Like [`PreviewResolver::resolve`] with the type given as a string. An
    /// empty string counts as no type.
    pub async fn resolve_str(
        &self,
        url: &str,
        requested: Option<&str>,
    ) -> Result<Resolution, ResolveError> {
        let requested = requested
            .filter(|requested| !requested.is_empty())
            .map(RequestedType::parse);
        self.resolve(url, requested).await
    }

    /// Resolves independent URLs concurrently. Outcomes keep input order.
    pub async fn resolve_batch(&self, urls: &[&str]) -> Vec<Result<Resolution, ResolveError>> {
        let futures = urls.iter().map(|url| self.resolve(url, None));
        futures::future::join_all(futures).await
    }
}

#[async_trait]
impl PreviewResolver for OembedResolver {
    /// Every failure, including an expired deadline, is reported as
    /// `UnknownProvider` for the requested URL. The underlying error is only
    /// logged.
    #[instrument(level = "debug", skip(self))]
    async fn resolve(
        &self,
        url: &str,
        requested: Option<RequestedType>,
    ) -> Result<Resolution, ResolveError> {
        let outcome = match self.config.request_deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.run(url, requested))
                .await
                .unwrap_or_else(|_| {
                    Err(ResolveError::TimeoutError(format!(
                        "resolution exceeded {deadline:?}"
                    )))
                }),
            None => self.run(url, requested).await,
        };

        match outcome {
            Ok(Some(resolution)) => Ok(resolution),
            Ok(None) => Err(ResolveError::unknown_provider(url)),
            Err(e) => {
                e.log();
                Err(ResolveError::unknown_provider(url))
            }
        }
    }
}

/// Compares URLs after parsing so that normalization by the HTTP client (a
/// trailing slash on a bare host, say) doesn't count as a redirect.
fn is_redirected(requested: &str, final_url: &str) -> bool {
    match (Url::parse(requested), Url::parse(final_url)) {
        (Ok(a), Ok(b)) => a != b,
        _ => requested != final_url,
    }
}

/// Fails with `UnknownProvider` when a fetch of `requested` ended up on an
/// unsafe URL.
fn ensure_safe_redirect(requested: &str, final_url: &str) -> Result<(), ResolveError> {
    if is_redirected(requested, final_url) && is_unsafe(final_url) {
        warn!(url = %requested, final_url = %final_url, "Redirected to unsafe URL");
        return Err(ResolveError::unknown_provider(final_url));
    }
    Ok(())
}

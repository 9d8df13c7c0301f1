#![allow(dead_code)]

use async_trait::async_trait;
use oembed_resolver::{
    Dimension, Endpoint, ExternalFetch, ExtractParams, FetchOptions, FetchResponse, KnownProviderExtractor,
    MetadataExtractor, OembedData, OembedResolver, OembedType, Provider, ResolveError,
    ResolverConfig, ScrapedMetadata, StaticRegistry,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

enum Route {
    Page { final_url: String, body: String },
    Fail,
}

/// In-memory fetcher keyed by exact URL. Unknown URLs fail like a refused
/// connection.
#[derive(Default)]
pub struct FakeFetcher {
    routes: HashMap<String, Route>,
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, FetchOptions)>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, body: &str) -> Self {
        self.redirect(url, url, body)
    }

    pub fn redirect(mut self, from: &str, to: &str, body: &str) -> Self {
        self.routes.insert(
            from.to_string(),
            Route::Page {
                final_url: to.to_string(),
                body: body.to_string(),
            },
        );
        self
    }

    pub fn json(self, url: &str, body: Value) -> Self {
        self.page(url, &body.to_string())
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.routes.insert(url.to_string(), Route::Fail);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn options_for(&self, url: &str) -> Option<FetchOptions> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|(called, _)| called == url)
            .map(|(_, options)| options.clone())
    }
}

#[async_trait]
impl ExternalFetch for FakeFetcher {
    async fn fetch(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<FetchResponse, ResolveError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), options.clone()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.routes.get(url) {
            Some(Route::Page { final_url, body }) => Ok(FetchResponse {
                url: final_url.clone(),
                body: body.clone(),
            }),
            Some(Route::Fail) => Err(ResolveError::FetchError(format!("{url}: 500"))),
            None => Err(ResolveError::FetchError(format!("{url}: connection refused"))),
        }
    }
}

/// Known-provider extractor that records its calls and returns a canned
/// response, or fails when none is set.
#[derive(Default)]
pub struct FakeProviderClient {
    response: Option<OembedData>,
    calls: Mutex<Vec<(String, String, u32)>>,
}

impl FakeProviderClient {
    pub fn returning(data: OembedData) -> Self {
        Self {
            response: Some(data),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    /// `(url, provider_name, max_width)` per call.
    pub fn calls(&self) -> Vec<(String, String, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl KnownProviderExtractor for FakeProviderClient {
    async fn extract(
        &self,
        url: &str,
        provider: &Provider,
        params: &ExtractParams,
    ) -> Result<OembedData, ResolveError> {
        self.calls.lock().unwrap().push((
            url.to_string(),
            provider.provider_name.clone(),
            params.max_width,
        ));

        self.response
            .clone()
            .ok_or_else(|| ResolveError::FetchError("provider returned 404".into()))
    }
}

/// Metadata extractor returning fixed fields regardless of input.
pub struct FixedExtractor(pub ScrapedMetadata);

impl MetadataExtractor for FixedExtractor {
    fn extract(&self, _html: &str, _url: &str) -> Result<ScrapedMetadata, ResolveError> {
        Ok(self.0.clone())
    }
}

pub fn provider(name: &str, provider_url: &str, schemes: &[&str]) -> Provider {
    Provider {
        provider_name: name.to_string(),
        provider_url: provider_url.to_string(),
        endpoints: vec![Endpoint {
            schemes: schemes.iter().map(|s| s.to_string()).collect(),
            url: format!("{provider_url}/oembed"),
            discovery: false,
        }],
    }
}

pub fn registry() -> Arc<StaticRegistry> {
    Arc::new(
        StaticRegistry::new(vec![
            provider(
                "YouTube",
                "https://www.youtube.com",
                &["https://*.youtube.com/watch*", "https://youtu.be/*"],
            ),
            provider("Vimeo", "https://vimeo.com", &["https://vimeo.com/*"]),
        ])
        .unwrap(),
    )
}

pub fn video() -> OembedData {
    OembedData {
        kind: OembedType::Video,
        version: "1.0".into(),
        html: Some("<iframe src=\"https://player.example/1\"></iframe>".into()),
        url: None,
        title: Some("A video".into()),
        width: Some(Dimension::Number(640.into())),
        height: Some(Dimension::Number(360.into())),
        author_name: None,
        author_url: None,
        provider_name: Some("Vimeo".into()),
        provider_url: Some("https://vimeo.com/".into()),
        thumbnail_url: None,
        thumbnail_width: None,
        thumbnail_height: None,
    }
}

pub fn resolver_with(
    fetcher: Arc<FakeFetcher>,
    known: Arc<FakeProviderClient>,
    extractor: Arc<dyn MetadataExtractor>,
    config: ResolverConfig,
) -> OembedResolver {
    OembedResolver::with_components(registry(), fetcher, known, extractor, config)
}

pub fn resolver(fetcher: Arc<FakeFetcher>, known: Arc<FakeProviderClient>) -> OembedResolver {
    resolver_with(
        fetcher,
        known,
        Arc::new(oembed_resolver::HtmlMetadataExtractor::new()),
        ResolverConfig::default(),
    )
}

pub const ARTICLE_HTML: &str = r#"<html><head>
    <title>An Article</title>
    <meta property="og:title" content="An Article">
    <meta property="og:description" content="About things">
    <meta property="og:image" content="https://example.com/cover.jpg">
</head><body></body></html>"#;

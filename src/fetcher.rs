use crate::security::is_unsafe;
use crate::ResolveError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{redirect, Client, Method};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Per-request options for an outbound fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub method: Method,
    /// Overrides the fetcher's shared default timeout when set.
    pub timeout: Option<Duration>,
    pub follow_redirects: bool,
    /// Ask for a JSON response.
    pub json: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            timeout: None,
            follow_redirects: true,
            json: false,
        }
    }
}

impl FetchOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn json(mut self) -> Self {
        self.json = true;
        self
    }

    pub fn without_redirects(mut self) -> Self {
        self.follow_redirects = false;
        self
    }
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Final URL after any redirects.
    pub url: String,
    pub body: String,
}

impl FetchResponse {
    pub fn json(&self) -> Result<Value, ResolveError> {
        serde_json::from_str(&self.body)
            .map_err(|e| ResolveError::FetchError(format!("invalid JSON from {}: {e}", self.url)))
    }
}

/// Outbound HTTP capability. Transport failures, timeouts and non-success
/// statuses are errors.
#[async_trait]
pub trait ExternalFetch: Send + Sync {
    async fn fetch(&self, url: &str, options: &FetchOptions)
        -> Result<FetchResponse, ResolveError>;
}

/// Configuration for the default reqwest-backed [`Fetcher`].
///
/// ```ignore
/// let fetcher = Fetcher::with_config(FetcherConfig {
///     user_agent: "my-agent/1.0".to_string(),
///     timeout: Duration::from_secs(5),
///     ..Default::default()
/// })?;
/// ```
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub user_agent: String,
    /// Shared default timeout for requests that don't set their own.
    pub timeout: Duration,
    pub headers: Option<HeaderMap>,
    pub max_redirects: usize,
    /// Refuse redirect hops whose target fails [`is_unsafe`].
    pub guard_redirects: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("oembed-resolver/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(10),
            headers: None,
            max_redirects: 10,
            guard_redirects: true,
        }
    }
}

#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    no_redirect_client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self, ResolveError> {
        Self::with_config(FetcherConfig::default())
    }

    pub fn with_config(config: FetcherConfig) -> Result<Self, ResolveError> {
        let client = Self::builder(&config)
            .redirect(redirect_policy(config.max_redirects, config.guard_redirects))
            .build()
            .map_err(|e| ResolveError::FetchError(format!("failed to build HTTP client: {e}")))?;

        let no_redirect_client = Self::builder(&config)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| ResolveError::FetchError(format!("failed to build HTTP client: {e}")))?;

        debug!(timeout = ?config.timeout, max_redirects = config.max_redirects, "Fetcher initialized");

        Ok(Self {
            client,
            no_redirect_client,
        })
    }

    fn builder(config: &FetcherConfig) -> reqwest::ClientBuilder {
        let mut builder = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .pool_max_idle_per_host(10);

        if let Some(headers) = &config.headers {
            builder = builder.default_headers(headers.clone());
        }

        builder
    }
}

fn redirect_policy(max_redirects: usize, guard: bool) -> redirect::Policy {
    redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() >= max_redirects {
            attempt.error(format!("too many redirects (max {max_redirects})"))
        } else if guard && is_unsafe(attempt.url().as_str()) {
            let target = attempt.url().to_string();
            warn!(url = %target, "Refusing redirect to unsafe URL");
            attempt.error(format!("redirect to unsafe URL refused: {target}"))
        } else {
            attempt.follow()
        }
    })
}

#[async_trait]
impl ExternalFetch for Fetcher {
    #[instrument(level = "debug", skip(self, options), err)]
    async fn fetch(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<FetchResponse, ResolveError> {
        let client = if options.follow_redirects {
            &self.client
        } else {
            &self.no_redirect_client
        };

        let mut request = client.request(options.method.clone(), url);
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }
        if options.json {
            request = request.header(ACCEPT, HeaderValue::from_static("application/json"));
        }

        let response = request.send().await?.error_for_status()?;
        let final_url = response.url().to_string();
        let body = response.text().await?;

        debug!(url = %url, final_url = %final_url, content_length = body.len(), "Fetched");
        Ok(FetchResponse {
            url: final_url,
            body,
        })
    }
}

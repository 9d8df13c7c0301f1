//! oEmbed provider registry and URL-variant matching.
//!
//! Provider lists are inconsistent about `http` vs `https` and bare vs `www.`
//! hosts, so [`find_provider`] probes a fixed set of reconstructions of the
//! input before giving up.

use crate::ResolveError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// One entry of a `providers.json` style registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub provider_name: String,
    pub provider_url: String,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(default)]
    pub schemes: Vec<String>,
    pub url: String,
    #[serde(default)]
    pub discovery: bool,
}

impl Provider {
    /// Picks the endpoint serving `url`: the first one with a matching scheme,
    /// else the first endpoint without schemes.
    pub fn endpoint_for(&self, url: &str) -> Option<&Endpoint> {
        self.endpoints
            .iter()
            .find(|endpoint| {
                endpoint
                    .schemes
                    .iter()
                    .filter_map(|scheme| scheme_regex(scheme).ok())
                    .any(|re| re.is_match(url))
            })
            .or_else(|| self.endpoints.iter().find(|e| e.schemes.is_empty()))
    }
}

/// Read-only lookup from a URL to the provider that serves it.
pub trait ProviderRegistry: Send + Sync {
    fn has_provider(&self, url: &str) -> Option<Provider>;
}

impl<F> ProviderRegistry for F
where
    F: Fn(&str) -> Option<Provider> + Send + Sync,
{
    fn has_provider(&self, url: &str) -> Option<Provider> {
        self(url)
    }
}

struct CompiledProvider {
    provider: Provider,
    patterns: Vec<Regex>,
    host: Option<String>,
}

/// Registry over a fixed provider list with scheme globs compiled up front.
pub struct StaticRegistry {
    entries: Vec<CompiledProvider>,
}

impl StaticRegistry {
    pub fn new(providers: Vec<Provider>) -> Result<Self, ResolveError> {
        let mut entries = Vec::with_capacity(providers.len());

        for provider in providers {
            let mut patterns = Vec::new();
            for endpoint in &provider.endpoints {
                for scheme in &endpoint.schemes {
                    patterns.push(scheme_regex(scheme)?);
                }
            }

            let host_only = provider.endpoints.iter().any(|e| e.schemes.is_empty());
            let host = if host_only {
                Url::parse(&provider.provider_url)
                    .ok()
                    .and_then(|u| u.host_str().map(strip_www))
            } else {
                None
            };

            entries.push(CompiledProvider {
                provider,
                patterns,
                host,
            });
        }

        debug!(providers = entries.len(), "Provider registry compiled");
        Ok(Self { entries })
    }

    pub fn from_json(json: &str) -> Result<Self, ResolveError> {
        let providers: Vec<Provider> = serde_json::from_str(json)
            .map_err(|e| ResolveError::InvalidPattern(format!("invalid provider list: {e}")))?;
        Self::new(providers)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ProviderRegistry for StaticRegistry {
    fn has_provider(&self, url: &str) -> Option<Provider> {
        let url_host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(strip_www));

        self.entries
            .iter()
            .find(|entry| {
                entry.patterns.iter().any(|re| re.is_match(url))
                    || matches!((&entry.host, &url_host), (Some(a), Some(b)) if a == b)
            })
            .map(|entry| entry.provider.clone())
    }
}

fn strip_www(host: &str) -> String {
    host.strip_prefix("www.").unwrap_or(host).to_ascii_lowercase()
}

/// Compiles a scheme glob such as `https://*.youtube.com/watch*` into an
/// anchored regex where `*` matches any run of characters.
fn scheme_regex(scheme: &str) -> Result<Regex, ResolveError> {
    let body = scheme
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");

    Regex::new(&format!("^{body}$"))
        .map_err(|e| ResolveError::InvalidPattern(format!("{scheme}: {e}")))
}

/// The URL variant that matched a registry entry, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderMatch {
    pub url: String,
    pub provider: Option<Provider>,
}

impl ProviderMatch {
    pub fn matched(&self) -> bool {
        self.provider.is_some()
    }
}

/// Strips a leading `//` or `http(s)://(www.)?`, leaving host and path.
fn bare_url(url: &str) -> &str {
    if let Some(rest) = url.strip_prefix("//") {
        return rest;
    }

    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"));

    match rest {
        Some(rest) => rest.strip_prefix("www.").unwrap_or(rest),
        None => url,
    }
}

/// Tries `http://`, `https://`, `http://www.` and `https://www.` in that order
/// and returns the first variant the registry knows. Falls back to the input
/// unchanged with no provider.
pub fn find_provider(registry: &dyn ProviderRegistry, url: &str) -> ProviderMatch {
    let bare = bare_url(url);

    for prefix in ["http://", "https://", "http://www.", "https://www."] {
        let candidate = format!("{prefix}{bare}");
        if let Some(provider) = registry.has_provider(&candidate) {
            debug!(url = %url, candidate = %candidate, provider = %provider.provider_name, "Matched oEmbed provider");
            return ProviderMatch {
                url: candidate,
                provider: Some(provider),
            };
        }
    }

    ProviderMatch {
        url: url.to_string(),
        provider: None,
    }
}

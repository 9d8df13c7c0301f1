use crate::utils;
use crate::ResolveError;
use scraper::{Html, Selector};
use url::Url;

/// Raw page metadata as produced by an extraction backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedMetadata {
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub image: Option<String>,
    pub logo: Option<String>,
}

/// Best-effort metadata extraction from an HTML document.
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, html: &str, url: &str) -> Result<ScrapedMetadata, ResolveError>;
}

/// Metadata extractor reading Open Graph, Twitter card and plain HTML tags.
#[derive(Clone, Default)]
pub struct HtmlMetadataExtractor;

impl HtmlMetadataExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_title(&self, document: &Html) -> Option<String> {
        meta_content(
            document,
            &[
                "meta[property='og:title']",
                "meta[name='twitter:title']",
            ],
        )
        .or_else(|| {
            let title_selector = Selector::parse("title").ok()?;
            document
                .select(&title_selector)
                .next()
                .map(|el| el.text().collect::<String>())
                .and_then(|title| non_empty(&title))
        })
    }

    fn extract_description(&self, document: &Html) -> Option<String> {
        meta_content(
            document,
            &[
                "meta[property='og:description']",
                "meta[name='twitter:description']",
                "meta[name='description']",
            ],
        )
    }

    fn extract_author(&self, document: &Html) -> Option<String> {
        meta_content(
            document,
            &["meta[name='author']", "meta[property='article:author']"],
        )
    }

    fn extract_publisher(&self, document: &Html) -> Option<String> {
        meta_content(
            document,
            &[
                "meta[property='og:site_name']",
                "meta[name='application-name']",
            ],
        )
    }

    fn extract_image(&self, document: &Html, base: &Url) -> Option<String> {
        meta_content(
            document,
            &[
                "meta[property='og:image']",
                "meta[property='og:image:url']",
                "meta[name='twitter:image']",
                "meta[itemprop='image']",
            ],
        )
        .and_then(|href| utils::absolutize(base, &href))
    }

    fn extract_logo(&self, document: &Html, base: &Url) -> Option<String> {
        first_attr(
            document,
            &[
                "link[rel='apple-touch-icon']",
                "link[rel='icon']",
                "link[rel='shortcut icon']",
            ],
            "href",
        )
        .or_else(|| meta_content(document, &["meta[property='og:logo']"]))
        .and_then(|href| utils::absolutize(base, &href))
        .or_else(|| utils::default_favicon(base))
    }

    fn extract_url(&self, document: &Html, base: &Url) -> Option<String> {
        meta_content(document, &["meta[property='og:url']"])
            .or_else(|| first_attr(document, &["link[rel='canonical']"], "href"))
            .and_then(|href| utils::absolutize(base, &href))
    }
}

impl MetadataExtractor for HtmlMetadataExtractor {
    fn extract(&self, html: &str, url: &str) -> Result<ScrapedMetadata, ResolveError> {
        let base = Url::parse(url)?;
        let document = Html::parse_document(html);

        Ok(ScrapedMetadata {
            url: self
                .extract_url(&document, &base)
                .or_else(|| Some(url.to_string())),
            title: self.extract_title(&document),
            description: self.extract_description(&document),
            author: self.extract_author(&document),
            publisher: self.extract_publisher(&document),
            image: self.extract_image(&document, &base),
            logo: self.extract_logo(&document, &base),
        })
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// First non-empty `attr` over `selectors`, tried in priority order.
fn first_attr(document: &Html, selectors: &[&str], attr: &str) -> Option<String> {
    selectors.iter().find_map(|selector| {
        let selector = Selector::parse(selector).ok()?;
        document
            .select(&selector)
            .filter_map(|el| el.value().attr(attr))
            .find_map(non_empty)
    })
}

fn meta_content(document: &Html, selectors: &[&str]) -> Option<String> {
    first_attr(document, selectors, "content")
}

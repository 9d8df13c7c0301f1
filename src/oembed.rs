//! oEmbed response model and sanitization of untrusted payloads.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OembedType {
    Photo,
    Video,
    Link,
    Rich,
}

impl OembedType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "photo" => Some(OembedType::Photo),
            "video" => Some(OembedType::Video),
            "link" => Some(OembedType::Link),
            "rich" => Some(OembedType::Rich),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OembedType::Photo => "photo",
            OembedType::Video => "video",
            OembedType::Link => "link",
            OembedType::Rich => "rich",
        }
    }
}

impl fmt::Display for OembedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A width or height as the provider sent it. Providers disagree on numbers
/// vs strings (`"100%"`), so the value is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dimension {
    Number(Number),
    Text(String),
}

impl Dimension {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Dimension::Number(n.clone())),
            Value::String(s) => Some(Dimension::Text(s.clone())),
            _ => None,
        }
    }

    /// Zero and the empty string count as missing.
    pub fn is_present(&self) -> bool {
        match self {
            Dimension::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(true),
            Dimension::Text(s) => !s.is_empty(),
        }
    }
}

/// Sanitized oEmbed record. Only allow-listed fields exist on this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OembedData {
    #[serde(rename = "type")]
    pub kind: OembedType,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Dimension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Dimension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_width: Option<Dimension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_height: Option<Dimension>,
}

impl OembedData {
    /// Type-specific completeness: photos need `url`, videos and rich embeds
    /// need `html`, `width` and `height`.
    pub fn is_complete(&self) -> bool {
        let text = |field: &Option<String>| field.as_deref().is_some_and(|s| !s.is_empty());
        let dim = |field: &Option<Dimension>| field.as_ref().is_some_and(Dimension::is_present);

        match self.kind {
            OembedType::Photo => text(&self.url),
            OembedType::Video | OembedType::Rich => {
                text(&self.html) && dim(&self.width) && dim(&self.height)
            }
            OembedType::Link => true,
        }
    }
}

/// Validates `type` and `version` and picks the allow-listed fields out of an
/// arbitrary JSON body. Every other key is dropped. Text fields that are not
/// strings are treated as absent.
pub fn project(body: &Value) -> Option<OembedData> {
    let obj = body.as_object()?;

    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .and_then(OembedType::parse)?;

    let version = match obj.get("version")? {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) if n.as_f64() != Some(0.0) => n.to_string(),
        _ => return None,
    };

    let text = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);
    let dim = |key: &str| obj.get(key).and_then(Dimension::from_value);

    Some(OembedData {
        kind,
        version,
        html: text("html"),
        url: text("url"),
        title: text("title"),
        width: dim("width"),
        height: dim("height"),
        author_name: text("author_name"),
        author_url: text("author_url"),
        provider_name: text("provider_name"),
        provider_url: text("provider_url"),
        thumbnail_url: text("thumbnail_url"),
        thumbnail_width: dim("thumbnail_width"),
        thumbnail_height: dim("thumbnail_height"),
    })
}

/// [`project`] followed by the completeness rules. `None` means the body
/// carries no usable oEmbed data.
pub fn sanitize(body: &Value) -> Option<OembedData> {
    project(body).filter(OembedData::is_complete)
}

/// Finds the first `<link type="application/json+oembed">` href in `html`,
/// resolved against `base_url`.
pub fn find_discovery_link(html: &str, base_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"link[type="application/json+oembed"]"#).ok()?;

    let href = document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())?;

    match Url::parse(base_url) {
        Ok(base) => base.join(href).ok().map(String::from),
        Err(_) => Some(href.to_string()),
    }
}

/// Keys [`project`] keeps.
pub const KNOWN_FIELDS: [&str; 14] = [
    "type",
    "version",
    "html",
    "url",
    "title",
    "width",
    "height",
    "author_name",
    "author_url",
    "provider_name",
    "provider_url",
    "thumbnail_url",
    "thumbnail_width",
    "thumbnail_height",
];

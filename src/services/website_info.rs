//! Website metadata lookup used to prefill the bookmark editor.
//!
//! A baseline built from the URL alone is always available. Two remote sources
//! (an HTML proxy and Microlink) are queried concurrently and may improve on it;
//! their failures are logged and otherwise ignored.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use reqwest::Url;
use serde_json::Value;

use crate::services::http_client::{build_url, JsonFetcher};
use crate::types::errors::FetchError;
use crate::types::settings::ApiSettings;
use crate::types::website::{PartialMetadata, WebsiteInfoSimple, WebsiteMetadata};

const BASELINE_FAVICON_SIZE: u32 = 64;
const BASELINE_LOGO_SIZE: u32 = 128;

/// Host of `url` without a leading `www.`; the raw input if it does not parse.
pub fn extract_domain(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => host.strip_prefix("www.").unwrap_or(host).to_string(),
            None => url.to_string(),
        },
        Err(_) => url.to_string(),
    }
}

pub fn is_valid_url(url: &str) -> bool {
    Url::parse(url).is_ok()
}

/// Prefixes `https://` unless the URL already carries an http(s) scheme.
pub fn normalize_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Favicon service URL for the domain of `url`.
pub fn favicon_url(favicon_base: &str, url: &str, size: u32) -> String {
    format!("{}?domain={}&sz={}", favicon_base, extract_domain(url), size)
}

/// Uppercases the first character.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Text between `<tag ...>` and `</tag>`, matched case-insensitively.
fn extract_between_tags(html: &str, lower: &str, tag: &str) -> Option<String> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);
    let start_idx = lower.find(&open)?;
    let tag_end = lower[start_idx..].find('>')?;
    let content_start = start_idx + tag_end + 1;
    let end_idx = lower[content_start..].find(&close)?;
    Some(html[content_start..content_start + end_idx].to_string())
}

/// Value of attribute `name` inside a single tag's source text.
fn attribute(tag: &str, name: &str) -> Option<String> {
    let lower = tag.to_ascii_lowercase();
    let needle = format!("{}=", name);
    let mut from = 0;
    while let Some(pos) = lower[from..].find(&needle) {
        let at = from + pos;
        let boundary = at == 0 || lower.as_bytes()[at - 1].is_ascii_whitespace();
        let value_start = at + needle.len();
        if boundary {
            let rest = &tag[value_start..];
            return match rest.chars().next() {
                Some(q @ ('"' | '\'')) => {
                    let body = &rest[1..];
                    body.find(q).map(|end| body[..end].to_string())
                }
                Some(_) => {
                    let end = rest
                        .find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
                        .unwrap_or(rest.len());
                    Some(rest[..end].to_string())
                }
                None => None,
            };
        }
        from = value_start;
    }
    None
}

/// `content` of the first `<meta>` whose `key` attribute equals `value`.
fn meta_content(html: &str, lower: &str, key: &str, value: &str) -> Option<String> {
    let mut from = 0;
    while let Some(pos) = lower[from..].find("<meta") {
        let start = from + pos;
        let end = lower[start..].find('>').map(|e| start + e).unwrap_or(lower.len());
        let tag = &html[start..end];
        if attribute(tag, key).is_some_and(|v| v.eq_ignore_ascii_case(value)) {
            return attribute(tag, "content");
        }
        from = end;
    }
    None
}

/// Title, meta description and `og:image` from a page's HTML.
pub fn parse_proxy_html(html: &str) -> PartialMetadata {
    let lower = html.to_ascii_lowercase();
    PartialMetadata {
        title: non_empty(
            extract_between_tags(html, &lower, "title")
                .map(|t| decode_entities(&t))
                .as_deref(),
        ),
        description: non_empty(
            meta_content(html, &lower, "name", "description")
                .map(|d| decode_entities(&d))
                .as_deref(),
        ),
        image: non_empty(meta_content(html, &lower, "property", "og:image").as_deref()),
        ..Default::default()
    }
}

/// Fields of a Microlink response; anything but `status == "success"` yields nothing.
pub fn parse_microlink(body: &Value) -> PartialMetadata {
    if body.get("status").and_then(Value::as_str) != Some("success") {
        return PartialMetadata::default();
    }
    let Some(data) = body.get("data").filter(|d| d.is_object()) else {
        return PartialMetadata::default();
    };
    let string = |key: &str| non_empty(data.get(key).and_then(Value::as_str));
    let asset_url = |key: &str| non_empty(data.get(key).and_then(|a| a.get("url")).and_then(Value::as_str));
    PartialMetadata {
        title: string("title"),
        description: string("description"),
        image: asset_url("image"),
        logo: asset_url("logo"),
        favicon: asset_url("favicon"),
    }
}

/// Overlays `sources` onto `base` in order. The title is only taken when it
/// differs from the bare domain.
pub fn merge_metadata(mut base: WebsiteMetadata, sources: &[PartialMetadata]) -> WebsiteMetadata {
    for source in sources {
        if let Some(title) = source.title.as_ref().filter(|t| **t != base.domain) {
            base.title = title.clone();
        }
        if let Some(description) = &source.description {
            base.description = Some(description.clone());
        }
        if let Some(image) = &source.image {
            base.image = Some(image.clone());
        }
        if let Some(logo) = &source.logo {
            base.logo = Some(logo.clone());
        }
        if let Some(favicon) = &source.favicon {
            base.favicon = favicon.clone();
        }
    }
    base
}

#[async_trait]
pub trait WebsiteInfoTrait {
    async fn fetch_website_info(&self, url: &str) -> WebsiteMetadata;
    async fn fetch_website_info_simple(&self, url: &str) -> WebsiteInfoSimple;
}

pub struct WebsiteInfoFetcher {
    fetcher: Arc<dyn JsonFetcher>,
    proxy_base: String,
    microlink_base: String,
    favicon_base: String,
}

impl WebsiteInfoFetcher {
    pub fn new(fetcher: Arc<dyn JsonFetcher>, api: &ApiSettings) -> Self {
        Self {
            fetcher,
            proxy_base: api.proxy_base.clone(),
            microlink_base: api.microlink_base.clone(),
            favicon_base: api.favicon_base.clone(),
        }
    }

    pub fn favicon_url(&self, url: &str, size: u32) -> String {
        favicon_url(&self.favicon_base, url, size)
    }

    /// Metadata derivable from the URL alone.
    pub fn baseline(&self, url: &str) -> WebsiteMetadata {
        let domain = extract_domain(url);
        WebsiteMetadata {
            title: capitalize(&domain),
            description: None,
            favicon: self.favicon_url(url, BASELINE_FAVICON_SIZE),
            logo: Some(self.favicon_url(url, BASELINE_LOGO_SIZE)),
            domain,
            image: None,
        }
    }

    async fn from_proxy(&self, url: &str) -> Result<PartialMetadata, FetchError> {
        let request = build_url(&self.proxy_base, "/get", &[("url", url)])?;
        let body = self.fetcher.get_json(&request).await?;
        match body.get("contents").and_then(Value::as_str) {
            Some(html) if !html.is_empty() => Ok(parse_proxy_html(html)),
            _ => Ok(PartialMetadata::default()),
        }
    }

    async fn from_microlink(&self, url: &str) -> Result<PartialMetadata, FetchError> {
        let request = build_url(&self.microlink_base, "", &[("url", url), ("palette", "true")])?;
        let body = self.fetcher.get_json(&request).await?;
        Ok(parse_microlink(&body))
    }
}

fn or_empty(source: &str, result: Result<PartialMetadata, FetchError>) -> PartialMetadata {
    result.unwrap_or_else(|e| {
        debug!("website: {} lookup failed: {}", source, e);
        PartialMetadata::default()
    })
}

#[async_trait]
impl WebsiteInfoTrait for WebsiteInfoFetcher {
    async fn fetch_website_info(&self, url: &str) -> WebsiteMetadata {
        let base = self.baseline(url);
        let normalized = normalize_url(url);
        let (proxy, microlink) = tokio::join!(
            self.from_proxy(&normalized),
            self.from_microlink(&normalized)
        );
        merge_metadata(
            base,
            &[or_empty("proxy", proxy), or_empty("microlink", microlink)],
        )
    }

    async fn fetch_website_info_simple(&self, url: &str) -> WebsiteInfoSimple {
        let info = self.fetch_website_info(url).await;
        WebsiteInfoSimple {
            name: info.title,
            favicon: info.favicon,
            logo: info.logo,
            domain: info.domain,
        }
    }
}

//! Unit tests for website metadata lookup: URL helpers, source merging and
//! degradation to the URL-derived baseline.

use std::sync::Arc;

use async_trait::async_trait;
use rstest::rstest;
use serde_json::{json, Value};

use armrest::services::http_client::JsonFetcher;
use armrest::services::website_info::{
    extract_domain, favicon_url, is_valid_url, normalize_url, WebsiteInfoFetcher, WebsiteInfoTrait,
};
use armrest::types::errors::FetchError;
use armrest::types::settings::ApiSettings;

/// Routes by host: proxy and microlink answers are configured separately.
struct SourcesFetcher {
    proxy: Option<Value>,
    microlink: Option<Value>,
}

#[async_trait]
impl JsonFetcher for SourcesFetcher {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let answer = if url.starts_with("https://proxy.test/get?") {
            self.proxy.clone()
        } else if url.starts_with("https://microlink.test/?") {
            self.microlink.clone()
        } else {
            None
        };
        answer.ok_or_else(|| FetchError::NetworkError(format!("unreachable: {}", url)))
    }
}

fn fetcher(proxy: Option<Value>, microlink: Option<Value>) -> WebsiteInfoFetcher {
    let api = ApiSettings {
        proxy_base: "https://proxy.test".to_string(),
        microlink_base: "https://microlink.test".to_string(),
        favicon_base: "https://icons.test/s2/favicons".to_string(),
        ..Default::default()
    };
    WebsiteInfoFetcher::new(Arc::new(SourcesFetcher { proxy, microlink }), &api)
}

#[rstest]
#[case("https://www.github.com/rust-lang", "github.com")]
#[case("https://sub.example.org:8080/path", "sub.example.org")]
#[case("github.com", "github.com")]
fn test_extract_domain(#[case] url: &str, #[case] expected: &str) {
    assert_eq!(extract_domain(url), expected);
}

#[test]
fn test_url_helpers() {
    assert!(is_valid_url("https://docs.rs"));
    assert!(!is_valid_url("docs.rs"));
    assert_eq!(normalize_url("docs.rs"), "https://docs.rs");
    assert_eq!(normalize_url("http://docs.rs"), "http://docs.rs");
    assert_eq!(
        favicon_url("https://www.google.com/s2/favicons", "https://www.docs.rs/x", 32),
        "https://www.google.com/s2/favicons?domain=docs.rs&sz=32"
    );
}

#[tokio::test]
async fn test_all_sources_failing_yields_baseline() {
    let info = fetcher(None, None).fetch_website_info("https://www.github.com").await;
    assert_eq!(info.title, "Github.com");
    assert_eq!(info.domain, "github.com");
    assert_eq!(info.favicon, "https://icons.test/s2/favicons?domain=github.com&sz=64");
    assert_eq!(
        info.logo.as_deref(),
        Some("https://icons.test/s2/favicons?domain=github.com&sz=128")
    );
    assert_eq!(info.description, None);
}

#[tokio::test]
async fn test_proxy_html_fills_title_and_description() {
    let proxy = json!({"contents": "<html><head><title>GitHub: Let's build</title>\
        <meta name=\"description\" content=\"Where the world builds software\"></head></html>"});
    let info = fetcher(Some(proxy), None).fetch_website_info("github.com").await;
    assert_eq!(info.title, "GitHub: Let's build");
    assert_eq!(info.description.as_deref(), Some("Where the world builds software"));
}

#[tokio::test]
async fn test_microlink_overrides_proxy() {
    let proxy = json!({"contents": "<title>Proxy title</title>"});
    let microlink = json!({"status": "success", "data": {
        "title": "Microlink title",
        "logo": {"url": "https://cdn.test/logo.png"},
        "favicon": {"url": "https://cdn.test/favicon.ico"},
        "image": {"url": "https://cdn.test/og.png"}
    }});
    let info = fetcher(Some(proxy), Some(microlink))
        .fetch_website_info("https://example.com")
        .await;
    assert_eq!(info.title, "Microlink title");
    assert_eq!(info.logo.as_deref(), Some("https://cdn.test/logo.png"));
    assert_eq!(info.favicon, "https://cdn.test/favicon.ico");
    assert_eq!(info.image.as_deref(), Some("https://cdn.test/og.png"));
}

#[tokio::test]
async fn test_title_equal_to_domain_is_ignored() {
    let microlink = json!({"status": "success", "data": {"title": "example.com"}});
    let info = fetcher(None, Some(microlink)).fetch_website_info("https://example.com").await;
    assert_eq!(info.title, "Example.com");
}

#[tokio::test]
async fn test_simple_info_shape() {
    let simple = fetcher(None, None)
        .fetch_website_info_simple("https://crates.io")
        .await;
    assert_eq!(simple.name, "Crates.io");
    assert_eq!(simple.domain, "crates.io");
    assert!(simple.logo.is_some());
}

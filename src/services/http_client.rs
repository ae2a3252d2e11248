//! Thin JSON-over-HTTP client shared by the network-facing services.
//!
//! Services depend on [`JsonFetcher`] rather than on `reqwest` directly so tests can
//! substitute a canned fetcher.

use std::time::Instant;

use async_trait::async_trait;
use log::debug;
use reqwest::Url;
use serde_json::Value;

use crate::types::errors::FetchError;

/// Performs a single GET and decodes the body as JSON.
#[async_trait]
pub trait JsonFetcher: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError>;
}

/// `reqwest`-backed fetcher. One attempt per call, no timeout, no retry.
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("armrest/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JsonFetcher for HttpClient {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;
        let status = response.status();
        debug!("GET {} -> {} in {} ms", url, status, started.elapsed().as_millis());
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::ParseError(e.to_string()))
    }
}

/// Joins `base` and `path` and appends URL-encoded query parameters.
pub fn build_url(base: &str, path: &str, query: &[(&str, &str)]) -> Result<String, FetchError> {
    let joined = format!("{}{}", base.trim_end_matches('/'), path);
    let url = if query.is_empty() {
        Url::parse(&joined)
    } else {
        Url::parse_with_params(&joined, query)
    }
    .map_err(|e| FetchError::NetworkError(format!("invalid url {}: {}", joined, e)))?;
    Ok(url.to_string())
}

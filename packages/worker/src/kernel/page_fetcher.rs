//! Outbound HTTP fetching for the scraper handlers.
//!
//! Every call carries an explicit timeout; third-party sites must never be
//! able to hang a worker slot.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

/// Downloaded body plus the content type the server reported.
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// HTTP operations the scraper handlers need.
#[async_trait]
pub trait BasePageFetcher: Send + Sync {
    /// GET a URL and return the body as text.
    async fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String>;

    /// GET a URL and return raw bytes plus content type.
    async fn fetch_bytes(&self, url: &str, timeout: Duration) -> Result<FetchedBody>;

    /// HEAD a URL and return the content type, or `None` on a non-success
    /// status.
    async fn head_content_type(&self, url: &str, timeout: Duration) -> Result<Option<String>>;
}

/// reqwest-backed fetcher with a browser-like identity.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new() -> Result<Self> {
        // Use a browser-like User-Agent to avoid bot detection
        let user_agent = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .parse()
                .unwrap(),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            "en-US,en;q=0.5".parse().unwrap(),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl BasePageFetcher for HttpPageFetcher {
    async fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .context("HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {} for {}", status, url);
        }

        response.text().await.context("Failed to read response body")
    }

    async fn fetch_bytes(&self, url: &str, timeout: Duration) -> Result<FetchedBody> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .context("HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {} for {}", status, url);
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let bytes = response
            .bytes()
            .await
            .context("Failed to read response body")?
            .to_vec();

        Ok(FetchedBody {
            bytes,
            content_type,
        })
    }

    async fn head_content_type(&self, url: &str, timeout: Duration) -> Result<Option<String>> {
        let response = self
            .client
            .head(url)
            .timeout(timeout)
            .send()
            .await
            .context("HTTP request failed")?;

        if !response.status().is_success() {
            return Ok(None);
        }

        Ok(response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string()))
    }
}

// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into WorkerDeps for tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{
    BaseCopywriter, BaseHtmlRenderer, BaseObjectStorage, BasePageFetcher, EmailCopy, FetchedBody,
    SocialCaptions,
};
use crate::domains::render::TemplatePromoData;

// =============================================================================
// In-memory Object Storage
// =============================================================================

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

/// Object storage backed by a HashMap, keyed by `bucket/key`.
pub struct MemoryObjectStorage {
    objects: Arc<Mutex<HashMap<String, StoredObject>>>,
    upload_calls: Arc<Mutex<Vec<String>>>,
}

impl MemoryObjectStorage {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(Mutex::new(HashMap::new())),
            upload_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Seed an object before the test runs
    pub fn with_object(self, bucket: &str, key: &str, bytes: Vec<u8>) -> Self {
        self.objects.lock().unwrap().insert(
            format!("{}/{}", bucket, key),
            StoredObject {
                bytes,
                content_type: "application/octet-stream".to_string(),
            },
        );
        self
    }

    /// Get a stored object's bytes
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&format!("{}/{}", bucket, key))
            .map(|o| o.bytes.clone())
    }

    /// Get a stored object's content type
    pub fn content_type_of(&self, bucket: &str, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(&format!("{}/{}", bucket, key))
            .map(|o| o.content_type.clone())
    }

    /// All keys in a bucket, sorted
    pub fn keys_in(&self, bucket: &str) -> Vec<String> {
        let prefix = format!("{}/", bucket);
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix).map(|s| s.to_string()))
            .collect();
        keys.sort();
        keys
    }

    /// All `bucket/key` paths that were uploaded, in order
    pub fn upload_calls(&self) -> Vec<String> {
        self.upload_calls.lock().unwrap().clone()
    }
}

impl Default for MemoryObjectStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseObjectStorage for MemoryObjectStorage {
    async fn download(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.object(bucket, key)
            .ok_or_else(|| anyhow!("no object at s3://{}/{}", bucket, key))
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let path = format!("{}/{}", bucket, key);
        self.upload_calls.lock().unwrap().push(path.clone());
        self.objects.lock().unwrap().insert(
            path,
            StoredObject {
                bytes: body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("https://{}.s3.amazonaws.com/{}", bucket, key)
    }
}

// =============================================================================
// Mock Page Fetcher
// =============================================================================

/// Page fetcher that serves canned responses by URL. Unknown URLs fail the
/// same way a 404 does, so handlers exercise their fallback paths.
pub struct MockPageFetcher {
    text_pages: Arc<Mutex<HashMap<String, String>>>,
    byte_pages: Arc<Mutex<HashMap<String, FetchedBody>>>,
    head_types: Arc<Mutex<HashMap<String, Option<String>>>>,
    fetch_calls: Arc<Mutex<Vec<String>>>,
    head_calls: Arc<Mutex<Vec<String>>>,
}

impl MockPageFetcher {
    pub fn new() -> Self {
        Self {
            text_pages: Arc::new(Mutex::new(HashMap::new())),
            byte_pages: Arc::new(Mutex::new(HashMap::new())),
            head_types: Arc::new(Mutex::new(HashMap::new())),
            fetch_calls: Arc::new(Mutex::new(Vec::new())),
            head_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Serve a text body for a URL
    pub fn with_page(self, url: &str, body: &str) -> Self {
        self.text_pages
            .lock()
            .unwrap()
            .insert(url.to_string(), body.to_string());
        self
    }

    /// Serve raw bytes for a URL
    pub fn with_bytes(self, url: &str, bytes: Vec<u8>, content_type: &str) -> Self {
        self.byte_pages.lock().unwrap().insert(
            url.to_string(),
            FetchedBody {
                bytes,
                content_type: Some(content_type.to_string()),
            },
        );
        self
    }

    /// Answer HEAD requests for a URL with a content type
    pub fn with_head_type(self, url: &str, content_type: &str) -> Self {
        self.head_types
            .lock()
            .unwrap()
            .insert(url.to_string(), Some(content_type.to_string()));
        self
    }

    /// All URLs fetched via GET, in order
    pub fn fetch_calls(&self) -> Vec<String> {
        self.fetch_calls.lock().unwrap().clone()
    }

    /// All URLs probed via HEAD, in order
    pub fn head_calls(&self) -> Vec<String> {
        self.head_calls.lock().unwrap().clone()
    }

    /// Check if a URL was fetched via GET
    pub fn was_fetched(&self, url: &str) -> bool {
        self.fetch_calls.lock().unwrap().iter().any(|u| u == url)
    }
}

impl Default for MockPageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BasePageFetcher for MockPageFetcher {
    async fn fetch_text(&self, url: &str, _timeout: Duration) -> Result<String> {
        self.fetch_calls.lock().unwrap().push(url.to_string());

        self.text_pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("HTTP 404 for {}", url))
    }

    async fn fetch_bytes(&self, url: &str, _timeout: Duration) -> Result<FetchedBody> {
        self.fetch_calls.lock().unwrap().push(url.to_string());

        if let Some(body) = self.byte_pages.lock().unwrap().get(url) {
            return Ok(body.clone());
        }
        // Fall back to text pages so a test seeding only HTML still works
        self.text_pages
            .lock()
            .unwrap()
            .get(url)
            .map(|text| FetchedBody {
                bytes: text.as_bytes().to_vec(),
                content_type: Some("text/html".to_string()),
            })
            .ok_or_else(|| anyhow!("HTTP 404 for {}", url))
    }

    async fn head_content_type(&self, url: &str, _timeout: Duration) -> Result<Option<String>> {
        self.head_calls.lock().unwrap().push(url.to_string());

        Ok(self
            .head_types
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or(None))
    }
}

// =============================================================================
// Mock HTML Renderer
// =============================================================================

/// Arguments captured from a render_png call
#[derive(Debug, Clone)]
pub struct RenderPngArgs {
    pub width: u32,
    pub height: u32,
    pub html: String,
}

pub struct MockHtmlRenderer {
    png_bytes: Vec<u8>,
    pdf_bytes: Vec<u8>,
    fail: bool,
    png_calls: Arc<Mutex<Vec<RenderPngArgs>>>,
    pdf_calls: Arc<Mutex<Vec<String>>>,
}

impl MockHtmlRenderer {
    pub fn new() -> Self {
        Self {
            png_bytes: b"\x89PNG mock image".to_vec(),
            pdf_bytes: b"%PDF-1.4 mock document".to_vec(),
            fail: false,
            png_calls: Arc::new(Mutex::new(Vec::new())),
            pdf_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A renderer whose every call fails, for crash-path tests
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn with_png(mut self, bytes: Vec<u8>) -> Self {
        self.png_bytes = bytes;
        self
    }

    pub fn with_pdf(mut self, bytes: Vec<u8>) -> Self {
        self.pdf_bytes = bytes;
        self
    }

    /// All render_png calls with their arguments
    pub fn png_calls(&self) -> Vec<RenderPngArgs> {
        self.png_calls.lock().unwrap().clone()
    }

    /// All HTML documents sent to render_pdf
    pub fn pdf_calls(&self) -> Vec<String> {
        self.pdf_calls.lock().unwrap().clone()
    }

    /// The HTML of the most recent render call of either kind
    pub fn last_html(&self) -> Option<String> {
        let from_png = self.png_calls.lock().unwrap().last().map(|c| c.html.clone());
        from_png.or_else(|| self.pdf_calls.lock().unwrap().last().cloned())
    }
}

impl Default for MockHtmlRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseHtmlRenderer for MockHtmlRenderer {
    async fn render_png(&self, html: &str, width: u32, height: u32) -> Result<Vec<u8>> {
        self.png_calls.lock().unwrap().push(RenderPngArgs {
            width,
            height,
            html: html.to_string(),
        });

        if self.fail {
            return Err(anyhow!("mock renderer failure"));
        }
        Ok(self.png_bytes.clone())
    }

    async fn render_pdf(&self, html: &str) -> Result<Vec<u8>> {
        self.pdf_calls.lock().unwrap().push(html.to_string());

        if self.fail {
            return Err(anyhow!("mock renderer failure"));
        }
        Ok(self.pdf_bytes.clone())
    }
}

// =============================================================================
// Mock Copywriter
// =============================================================================

pub struct MockCopywriter {
    captions: SocialCaptions,
    email: EmailCopy,
    caption_calls: Arc<Mutex<Vec<String>>>,
    email_calls: Arc<Mutex<Vec<String>>>,
}

impl MockCopywriter {
    pub fn new() -> Self {
        Self {
            captions: SocialCaptions {
                facebook: "Mock Facebook caption".to_string(),
                instagram: "Mock Instagram caption".to_string(),
                linkedin: "Mock LinkedIn caption".to_string(),
            },
            email: EmailCopy {
                subject: "Mock subject".to_string(),
                preheader: "Mock preheader".to_string(),
                body_html: "<p>Mock email body</p>".to_string(),
            },
            caption_calls: Arc::new(Mutex::new(Vec::new())),
            email_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_captions(mut self, captions: SocialCaptions) -> Self {
        self.captions = captions;
        self
    }

    pub fn with_email(mut self, email: EmailCopy) -> Self {
        self.email = email;
        self
    }

    /// Promo titles captions were requested for
    pub fn caption_calls(&self) -> Vec<String> {
        self.caption_calls.lock().unwrap().clone()
    }

    /// Promo titles email copy was requested for
    pub fn email_calls(&self) -> Vec<String> {
        self.email_calls.lock().unwrap().clone()
    }
}

impl Default for MockCopywriter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseCopywriter for MockCopywriter {
    async fn social_captions(&self, data: &TemplatePromoData) -> SocialCaptions {
        self.caption_calls
            .lock()
            .unwrap()
            .push(data.promo.title.clone());
        self.captions.clone()
    }

    async fn email_copy(&self, data: &TemplatePromoData) -> EmailCopy {
        self.email_calls
            .lock()
            .unwrap()
            .push(data.promo.title.clone());
        self.email.clone()
    }
}

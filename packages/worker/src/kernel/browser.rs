//! Headless-browser rendering adapter.
//!
//! A fresh Chromium instance is launched per render and torn down on every
//! path. The whole launch + navigate + capture sequence runs under an
//! explicit wall-clock timeout so a stuck page load can never stall a worker
//! slot; on expiry the abandoned browser handle is dropped, which kills the
//! child process.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, PrintToPdfParams};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::{Future, StreamExt};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Print-page preview size: US Letter at 96dpi.
pub const PREVIEW_VIEWPORT: (u32, u32) = (816, 1056);

/// Square social image size.
pub const SOCIAL_VIEWPORT: (u32, u32) = (1080, 1080);

/// HTML rasterization operations used by the render handlers.
#[async_trait]
pub trait BaseHtmlRenderer: Send + Sync {
    /// Rasterize HTML to a PNG at the given viewport size.
    async fn render_png(&self, html: &str, width: u32, height: u32) -> Result<Vec<u8>>;

    /// Render HTML to a US Letter PDF, zero margins, background graphics on.
    async fn render_pdf(&self, html: &str) -> Result<Vec<u8>>;
}

/// Chromium-backed renderer.
pub struct ChromiumRenderer {
    executable: Option<PathBuf>,
    render_timeout: Duration,
}

impl ChromiumRenderer {
    pub fn new(executable: Option<PathBuf>, render_timeout: Duration) -> Self {
        Self {
            executable,
            render_timeout,
        }
    }

    async fn with_timeout<T>(&self, work: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.render_timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(anyhow!(
                "render timed out after {}s",
                self.render_timeout.as_secs()
            )),
        }
    }

    /// Launch a browser and load the HTML into a page sized to the viewport.
    async fn open_page(
        &self,
        html: &str,
        width: u32,
        height: u32,
    ) -> Result<(Browser, JoinHandle<()>, Page)> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(width, height)
            .viewport(Viewport {
                width,
                height,
                ..Default::default()
            });
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| anyhow!("invalid browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch chromium")?;

        // The CDP event stream must be polled for the connection to make
        // progress; the task ends when the browser process goes away.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to open page")?;
        page.set_content(html)
            .await
            .context("failed to set page content")?;
        // Let images and fonts referenced by the template finish loading
        // before capture.
        page.wait_for_navigation()
            .await
            .context("page did not settle")?;

        Ok((browser, handler_task, page))
    }

    async fn teardown(mut browser: Browser, handler_task: JoinHandle<()>) {
        if let Err(e) = browser.close().await {
            warn!(error = %e, "failed to close browser cleanly");
        }
        let _ = browser.wait().await;
        handler_task.abort();
    }

    async fn capture_png(&self, html: &str, width: u32, height: u32) -> Result<Vec<u8>> {
        let (browser, handler_task, page) = self.open_page(html, width, height).await?;

        let screenshot = page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(false)
                    .build(),
            )
            .await
            .context("screenshot capture failed");

        Self::teardown(browser, handler_task).await;

        let bytes = screenshot?;
        debug!(width, height, size_bytes = bytes.len(), "captured png");
        Ok(bytes)
    }

    async fn capture_pdf(&self, html: &str) -> Result<Vec<u8>> {
        let (width, height) = PREVIEW_VIEWPORT;
        let (browser, handler_task, page) = self.open_page(html, width, height).await?;

        let pdf = page
            .pdf(PrintToPdfParams {
                print_background: Some(true),
                paper_width: Some(8.5),
                paper_height: Some(11.0),
                margin_top: Some(0.0),
                margin_bottom: Some(0.0),
                margin_left: Some(0.0),
                margin_right: Some(0.0),
                ..Default::default()
            })
            .await
            .context("pdf capture failed");

        Self::teardown(browser, handler_task).await;

        let bytes = pdf?;
        debug!(size_bytes = bytes.len(), "captured pdf");
        Ok(bytes)
    }
}

#[async_trait]
impl BaseHtmlRenderer for ChromiumRenderer {
    async fn render_png(&self, html: &str, width: u32, height: u32) -> Result<Vec<u8>> {
        self.with_timeout(self.capture_png(html, width, height))
            .await
    }

    async fn render_pdf(&self, html: &str) -> Result<Vec<u8>> {
        self.with_timeout(self.capture_pdf(html)).await
    }
}

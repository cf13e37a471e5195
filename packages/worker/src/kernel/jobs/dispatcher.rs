//! The worker loop: receive, route, acknowledge.
//!
//! Handler success deletes the message. Handler failure leaves it for
//! redelivery after the visibility lease expires. A body that cannot be
//! parsed into a [`JobPayload`] is dead-lettered right away since retrying
//! it can never succeed.

use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::payload::JobPayload;
use super::queue::QueueMessage;
use crate::domains::{brand, imports, render, reports};
use crate::kernel::WorkerDeps;

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Messages fetched per receive call
    pub batch_size: i64,
    /// Long-poll wait when the queue is empty
    pub wait_time: Duration,
    /// Pause after a queue error before retrying
    pub error_backoff: Duration,
    /// Identity in logs, useful when several workers share a queue
    pub worker_id: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            wait_time: Duration::from_secs(20),
            error_backoff: Duration::from_secs(1),
            worker_id: format!("worker-{}", Uuid::new_v4()),
        }
    }
}

pub struct Dispatcher {
    deps: WorkerDeps,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(deps: WorkerDeps) -> Self {
        Self::with_config(deps, DispatcherConfig::default())
    }

    pub fn with_config(deps: WorkerDeps, config: DispatcherConfig) -> Self {
        Self { deps, config }
    }

    /// Consume until `shutdown` fires. The long-poll is cancelled promptly;
    /// a message already being handled always finishes first.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        info!(
            worker_id = %self.config.worker_id,
            batch_size = self.config.batch_size,
            "dispatcher starting"
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let messages = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.deps.queue.receive(self.config.batch_size, self.config.wait_time) => {
                    match result {
                        Ok(messages) => messages,
                        Err(e) => {
                            error!(error = %e, "queue receive failed");
                            tokio::select! {
                                _ = shutdown.cancelled() => break,
                                _ = tokio::time::sleep(self.config.error_backoff) => {}
                            }
                            continue;
                        }
                    }
                }
            };

            for message in messages {
                self.process_message(message).await;
            }
        }

        info!(worker_id = %self.config.worker_id, "dispatcher stopped");
        Ok(())
    }

    /// One receive-and-process pass. Returns how many messages were handled.
    pub async fn poll_once(&self, wait: Duration) -> Result<usize> {
        let messages = self.deps.queue.receive(self.config.batch_size, wait).await?;
        let count = messages.len();
        for message in messages {
            self.process_message(message).await;
        }
        Ok(count)
    }

    async fn process_message(&self, message: QueueMessage) {
        let payload: JobPayload = match serde_json::from_value(message.body.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                error!(
                    message_id = %message.id,
                    error = %e,
                    "unroutable message body, dead-lettering"
                );
                let reason = format!("unroutable message body: {}", e);
                if let Err(e) = self.deps.queue.dead_letter(message.id, &reason).await {
                    error!(message_id = %message.id, error = %e, "failed to dead-letter message");
                }
                return;
            }
        };

        let job_id = payload.job_id();
        let job_type = payload.job_type();
        info!(
            job_id = %job_id,
            job_type = %job_type,
            receive_count = message.receive_count,
            "processing job"
        );

        match self.handle(payload).await {
            Ok(()) => match self
                .deps
                .queue
                .delete(message.id, message.receipt_handle)
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    warn!(message_id = %message.id, "receipt stale, message was already redelivered")
                }
                Err(e) => error!(message_id = %message.id, error = %e, "failed to delete message"),
            },
            Err(e) => {
                // Left on the queue; it redelivers after the visibility lease
                warn!(job_id = %job_id, job_type = %job_type, error = %e, "job handler failed");
            }
        }
    }

    async fn handle(&self, payload: JobPayload) -> Result<()> {
        let deps = &self.deps;
        match payload {
            JobPayload::ParseUpload(p) => imports::handle_parse_upload(deps, p).await,
            JobPayload::BrandBootstrap(p) => brand::handle_brand_bootstrap(deps, p).await,
            JobPayload::ProductUrlScrape(p) => brand::handle_product_url_scrape(deps, p).await,
            JobPayload::RenderPreview(p) => render::handle_render_preview(deps, p).await,
            JobPayload::RenderPdf(p) => render::handle_render_pdf(deps, p).await,
            JobPayload::RenderSocialImage(p) => render::handle_render_social_image(deps, p).await,
            JobPayload::ExportZip(p) => reports::handle_export_zip(deps, p).await,
            JobPayload::GenerateEmail(p) => render::handle_generate_email(deps, p).await,
            JobPayload::GenerateCoopReport(p) => {
                reports::handle_generate_coop_report(deps, p).await
            }
        }
    }
}

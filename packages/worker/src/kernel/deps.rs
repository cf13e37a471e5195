//! Worker dependencies (traits for testability)
//!
//! Central dependency container passed to every handler. All external
//! services sit behind trait abstractions so tests can substitute fakes.

use sqlx::PgPool;
use std::sync::Arc;

use crate::kernel::jobs::JobQueue;
use crate::kernel::{BaseCopywriter, BaseHtmlRenderer, BaseObjectStorage, BasePageFetcher};

/// Dependencies accessible to job handlers.
#[derive(Clone)]
pub struct WorkerDeps {
    pub db_pool: PgPool,
    pub queue: Arc<dyn JobQueue>,
    pub storage: Arc<dyn BaseObjectStorage>,
    pub fetcher: Arc<dyn BasePageFetcher>,
    pub renderer: Arc<dyn BaseHtmlRenderer>,
    pub copywriter: Arc<dyn BaseCopywriter>,
    /// Bucket the producer writes spreadsheet uploads into (read-only here)
    pub uploads_bucket: String,
    /// Bucket generated artifacts land in
    pub assets_bucket: String,
}

impl WorkerDeps {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db_pool: PgPool,
        queue: Arc<dyn JobQueue>,
        storage: Arc<dyn BaseObjectStorage>,
        fetcher: Arc<dyn BasePageFetcher>,
        renderer: Arc<dyn BaseHtmlRenderer>,
        copywriter: Arc<dyn BaseCopywriter>,
        uploads_bucket: impl Into<String>,
        assets_bucket: impl Into<String>,
    ) -> Self {
        Self {
            db_pool,
            queue,
            storage,
            fetcher,
            renderer,
            copywriter,
            uploads_bucket: uploads_bucket.into(),
            assets_bucket: assets_bucket.into(),
        }
    }
}

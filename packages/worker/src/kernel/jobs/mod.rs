//! Job pipeline infrastructure: payloads, job records, queue, dispatcher.

pub mod dispatcher;
pub mod job;
pub mod payload;
pub mod queue;

pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use job::{reconcile_stuck_jobs, run_job, Job, JobPollView, JobStatus, JobType};
pub use payload::{
    BrandBootstrapPayload, ExportZipPayload, GenerateCoopReportPayload, GenerateEmailPayload,
    JobPayload, ParseUploadPayload, ProductUrlScrapePayload, RenderPdfPayload,
    RenderPreviewPayload, RenderSocialImagePayload,
};
pub use queue::{JobQueue, PostgresJobQueue, QueueConfig, QueueMessage};

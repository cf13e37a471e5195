//! Kernel module - worker infrastructure and dependencies.

pub mod browser;
pub mod copywriter;
pub mod deps;
pub mod jobs;
pub mod object_storage;
pub mod page_fetcher;
pub mod test_dependencies;

pub use browser::{BaseHtmlRenderer, ChromiumRenderer, PREVIEW_VIEWPORT, SOCIAL_VIEWPORT};
pub use copywriter::{
    build_promo_summary, BaseCopywriter, EmailCopy, GeminiCopywriter, NoopCopywriter,
    SocialCaptions,
};
pub use deps::WorkerDeps;
pub use object_storage::{BaseObjectStorage, S3ObjectStorage};
pub use page_fetcher::{BasePageFetcher, FetchedBody, HttpPageFetcher};
pub use test_dependencies::{
    MemoryObjectStorage, MockCopywriter, MockHtmlRenderer, MockPageFetcher,
};

//! Test fixtures for creating test data.
//!
//! Fixtures go through the model methods, the same path the handlers use.

use std::sync::Arc;

use anyhow::Result;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use worker_core::domains::promos::{Account, Branch, Promo, PromoItem, Upload};
use worker_core::kernel::jobs::{PostgresJobQueue, QueueConfig};
use worker_core::kernel::{
    MemoryObjectStorage, MockCopywriter, MockHtmlRenderer, MockPageFetcher, WorkerDeps,
};

pub const UPLOADS_BUCKET: &str = "uploads-test";
pub const ASSETS_BUCKET: &str = "assets-test";

/// A three-row spreadsheet with well-known headers.
pub const SAMPLE_CSV: &str = "\
Product Name,Price,SKU,Unit
Claw Hammer,12.50,H-100,each
Ring Nails 2in,3.00,N-200,box
Work Gloves,8.99,G-300,pair
";

/// `WorkerDeps` wired to in-memory doubles, with the concrete handles kept
/// around so tests can seed inputs and inspect recorded calls.
pub struct TestDeps {
    pub deps: WorkerDeps,
    pub queue: Arc<PostgresJobQueue>,
    pub storage: Arc<MemoryObjectStorage>,
    pub fetcher: Arc<MockPageFetcher>,
    pub renderer: Arc<MockHtmlRenderer>,
    pub copywriter: Arc<MockCopywriter>,
}

pub fn build_deps(
    pool: &PgPool,
    storage: MemoryObjectStorage,
    fetcher: MockPageFetcher,
    renderer: MockHtmlRenderer,
) -> TestDeps {
    build_deps_with_queue(pool, storage, fetcher, renderer, QueueConfig::default())
}

pub fn build_deps_with_queue(
    pool: &PgPool,
    storage: MemoryObjectStorage,
    fetcher: MockPageFetcher,
    renderer: MockHtmlRenderer,
    queue_config: QueueConfig,
) -> TestDeps {
    let queue = Arc::new(PostgresJobQueue::with_config(pool.clone(), queue_config));
    let storage = Arc::new(storage);
    let fetcher = Arc::new(fetcher);
    let renderer = Arc::new(renderer);
    let copywriter = Arc::new(MockCopywriter::new());

    let deps = WorkerDeps::new(
        pool.clone(),
        queue.clone(),
        storage.clone(),
        fetcher.clone(),
        renderer.clone(),
        copywriter.clone(),
        UPLOADS_BUCKET,
        ASSETS_BUCKET,
    );

    TestDeps {
        deps,
        queue,
        storage,
        fetcher,
        renderer,
        copywriter,
    }
}

pub async fn create_test_account(pool: &PgPool) -> Result<Account> {
    Account::create(
        "Acme Hardware",              // name
        Some("https://acme.example"), // website_url
        pool,
    )
    .await
}

pub async fn create_test_branch(pool: &PgPool, account_id: Uuid) -> Result<Branch> {
    Branch::create(
        account_id,
        "Downtown",             // name
        Some("1 Main St"),      // address
        Some("555-0100"),       // phone
        None,                   // email
        Some("Stop by today!"), // cta
        pool,
    )
    .await
}

pub async fn create_test_promo(pool: &PgPool, account_id: Uuid) -> Result<Promo> {
    Promo::create(
        account_id,
        "Spring Sale",          // title
        Some("One week only"),  // subhead
        None,                   // cta
        "classic",              // template_id
        pool,
    )
    .await
}

pub async fn create_test_upload(
    pool: &PgPool,
    account_id: Uuid,
    promo_id: Uuid,
    s3_key: &str,
) -> Result<Upload> {
    Upload::create(account_id, Some(promo_id), s3_key, "items.csv", pool).await
}

/// An item carrying co-op accrual fields.
pub async fn create_coop_item(
    pool: &PgPool,
    promo_id: Uuid,
    name: &str,
    price: Decimal,
    coop_amount: Decimal,
    sort_order: i32,
) -> Result<PromoItem> {
    let item = PromoItem::create(promo_id, name, price, sort_order, pool).await?;
    PromoItem::set_coop(item.id, Some("Acme Tools"), Some(coop_amount), None, pool).await?;
    Ok(item)
}

//! Integration tests for the co-op accrual report and the asset bundle
//! export.

mod common;

use std::io::{Cursor, Read};

use rust_decimal::Decimal;
use test_context::test_context;
use uuid::Uuid;
use worker_core::domains::promos::{Asset, AssetType, PromoItem};
use worker_core::domains::reports::{handle_export_zip, handle_generate_coop_report};
use worker_core::kernel::jobs::{
    ExportZipPayload, GenerateCoopReportPayload, Job, JobPayload, JobStatus,
};
use worker_core::kernel::{
    BaseObjectStorage, MemoryObjectStorage, MockHtmlRenderer, MockPageFetcher,
};
use zip::ZipArchive;

use crate::common::{
    build_deps, create_coop_item, create_test_account, create_test_promo, TestDeps, TestHarness,
    ASSETS_BUCKET,
};

fn fresh_deps(pool: &sqlx::PgPool) -> TestDeps {
    build_deps(
        pool,
        MemoryObjectStorage::new(),
        MockPageFetcher::new(),
        MockHtmlRenderer::new(),
    )
}

// ============================================================================
// Co-op accrual report
// ============================================================================

/// Only items carrying a co-op vendor make the report; rows carry the
/// accrual amount and its share of the price.
#[test_context(TestHarness)]
#[tokio::test]
async fn test_coop_report_collects_flagged_items(ctx: &mut TestHarness) {
    let account = create_test_account(&ctx.db_pool).await.unwrap();
    let promo = create_test_promo(&ctx.db_pool, account.id).await.unwrap();
    create_coop_item(
        &ctx.db_pool,
        promo.id,
        "Claw Hammer",
        Decimal::new(2999, 2),
        Decimal::new(750, 2),
        0,
    )
    .await
    .unwrap();
    create_coop_item(
        &ctx.db_pool,
        promo.id,
        "Ring Nails",
        Decimal::new(450, 2),
        Decimal::new(100, 2),
        1,
    )
    .await
    .unwrap();
    // No co-op vendor, must not appear
    PromoItem::create(promo.id, "Work Gloves", Decimal::new(899, 2), 2, &ctx.db_pool)
        .await
        .unwrap();

    let td = fresh_deps(&ctx.db_pool);
    let payload = GenerateCoopReportPayload {
        job_id: Uuid::new_v4(),
        account_id: account.id,
        promo_id: promo.id,
    };
    Job::enqueue(
        &ctx.db_pool,
        td.queue.as_ref(),
        &JobPayload::GenerateCoopReport(payload.clone()),
    )
    .await
    .unwrap();

    handle_generate_coop_report(&td.deps, payload.clone())
        .await
        .unwrap();

    let asset = Asset::latest_of_type(promo.id, AssetType::CoopReport, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert!(asset.s3_key.ends_with(".csv"));
    assert_eq!(
        td.storage.content_type_of(ASSETS_BUCKET, &asset.s3_key).as_deref(),
        Some("text/csv")
    );

    let csv = String::from_utf8(td.storage.object(ASSETS_BUCKET, &asset.s3_key).unwrap()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Vendor,Product Name,SKU,Price,Co-op Amount,Co-op %,Note");
    assert_eq!(lines[1], "Acme Tools,Claw Hammer,,29.99,7.50,25.0,");
    assert_eq!(lines[2], "Acme Tools,Ring Nails,,4.50,1.00,22.2,");
    assert!(!csv.contains("Work Gloves"));

    let job = Job::find_by_id(payload.job_id, &ctx.db_pool).await.unwrap();
    assert_eq!(job.status, JobStatus::Done);
    let result = job.result.unwrap();
    assert_eq!(result["rowCount"], serde_json::json!(2));
    assert_eq!(result["promoTitle"], serde_json::json!("Spring Sale"));
    assert_eq!(result["accountName"], serde_json::json!("Acme Hardware"));
}

/// A promo with no flagged items still produces a header-only report.
#[test_context(TestHarness)]
#[tokio::test]
async fn test_coop_report_without_flagged_items(ctx: &mut TestHarness) {
    let account = create_test_account(&ctx.db_pool).await.unwrap();
    let promo = create_test_promo(&ctx.db_pool, account.id).await.unwrap();
    let td = fresh_deps(&ctx.db_pool);
    let payload = GenerateCoopReportPayload {
        job_id: Uuid::new_v4(),
        account_id: account.id,
        promo_id: promo.id,
    };
    Job::enqueue(
        &ctx.db_pool,
        td.queue.as_ref(),
        &JobPayload::GenerateCoopReport(payload.clone()),
    )
    .await
    .unwrap();

    handle_generate_coop_report(&td.deps, payload.clone())
        .await
        .unwrap();

    let asset = Asset::latest_of_type(promo.id, AssetType::CoopReport, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    let csv = String::from_utf8(td.storage.object(ASSETS_BUCKET, &asset.s3_key).unwrap()).unwrap();
    assert_eq!(csv.lines().count(), 1);

    let job = Job::find_by_id(payload.job_id, &ctx.db_pool).await.unwrap();
    assert_eq!(job.result.unwrap()["rowCount"], serde_json::json!(0));
}

// ============================================================================
// Asset bundle export
// ============================================================================

async fn seed_asset(
    td: &TestDeps,
    pool: &sqlx::PgPool,
    account_id: Uuid,
    promo_id: Uuid,
    asset_type: AssetType,
    timestamp: i64,
    bytes: &[u8],
) -> Asset {
    let key = Asset::build_storage_key(account_id, promo_id, None, asset_type, timestamp);
    td.storage
        .upload(ASSETS_BUCKET, &key, bytes.to_vec(), asset_type.content_type())
        .await
        .unwrap();
    Asset::create(
        account_id,
        promo_id,
        None,
        asset_type,
        &key,
        bytes.len() as i64,
        pool,
    )
    .await
    .unwrap()
}

/// The export bundles every stored asset, grouped by type inside the
/// archive.
#[test_context(TestHarness)]
#[tokio::test]
async fn test_zip_bundles_promo_assets(ctx: &mut TestHarness) {
    let account = create_test_account(&ctx.db_pool).await.unwrap();
    let promo = create_test_promo(&ctx.db_pool, account.id).await.unwrap();
    let td = fresh_deps(&ctx.db_pool);
    seed_asset(
        &td,
        &ctx.db_pool,
        account.id,
        promo.id,
        AssetType::Preview,
        1000,
        b"png-bytes",
    )
    .await;
    seed_asset(
        &td,
        &ctx.db_pool,
        account.id,
        promo.id,
        AssetType::Pdf,
        2000,
        b"pdf-bytes",
    )
    .await;

    let payload = ExportZipPayload {
        job_id: Uuid::new_v4(),
        account_id: account.id,
        promo_id: promo.id,
    };
    Job::enqueue(
        &ctx.db_pool,
        td.queue.as_ref(),
        &JobPayload::ExportZip(payload.clone()),
    )
    .await
    .unwrap();

    handle_export_zip(&td.deps, payload.clone()).await.unwrap();

    let zip_asset = Asset::latest_of_type(promo.id, AssetType::Zip, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    let zip_bytes = td.storage.object(ASSETS_BUCKET, &zip_asset.s3_key).unwrap();
    assert_eq!(zip_asset.size_bytes, zip_bytes.len() as i64);

    let mut archive = ZipArchive::new(Cursor::new(zip_bytes)).unwrap();
    assert_eq!(archive.len(), 2);
    let mut preview = Vec::new();
    archive
        .by_name("preview/1000.png")
        .unwrap()
        .read_to_end(&mut preview)
        .unwrap();
    assert_eq!(preview, b"png-bytes");
    let mut pdf = Vec::new();
    archive
        .by_name("pdf/2000.pdf")
        .unwrap()
        .read_to_end(&mut pdf)
        .unwrap();
    assert_eq!(pdf, b"pdf-bytes");

    let job = Job::find_by_id(payload.job_id, &ctx.db_pool).await.unwrap();
    assert_eq!(job.status, JobStatus::Done);
    let result = job.result.unwrap();
    assert_eq!(result["fileCount"], serde_json::json!(2));
    assert_eq!(result["s3Key"], serde_json::json!(zip_asset.s3_key));
}

/// A later export does not swallow earlier zip archives into itself.
#[test_context(TestHarness)]
#[tokio::test]
async fn test_zip_export_excludes_prior_zips(ctx: &mut TestHarness) {
    let account = create_test_account(&ctx.db_pool).await.unwrap();
    let promo = create_test_promo(&ctx.db_pool, account.id).await.unwrap();
    let td = fresh_deps(&ctx.db_pool);
    seed_asset(
        &td,
        &ctx.db_pool,
        account.id,
        promo.id,
        AssetType::Preview,
        1000,
        b"png-bytes",
    )
    .await;

    for _ in 0..2 {
        let payload = ExportZipPayload {
            job_id: Uuid::new_v4(),
            account_id: account.id,
            promo_id: promo.id,
        };
        Job::enqueue(
            &ctx.db_pool,
            td.queue.as_ref(),
            &JobPayload::ExportZip(payload.clone()),
        )
        .await
        .unwrap();
        handle_export_zip(&td.deps, payload.clone()).await.unwrap();

        let job = Job::find_by_id(payload.job_id, &ctx.db_pool).await.unwrap();
        assert_eq!(job.result.unwrap()["fileCount"], serde_json::json!(1));
    }

    let count = Asset::count_of_type(promo.id, AssetType::Zip, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

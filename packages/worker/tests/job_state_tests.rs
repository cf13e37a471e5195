//! Integration tests for job records: enqueue, the run_job state machine,
//! the polling view, and reconciliation of stuck jobs.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::anyhow;
use serde_json::json;
use test_context::test_context;
use uuid::Uuid;
use worker_core::kernel::jobs::{
    reconcile_stuck_jobs, run_job, Job, JobPayload, JobQueue, JobStatus, PostgresJobQueue,
    RenderPreviewPayload,
};

use crate::common::{create_test_account, create_test_promo, TestHarness};

fn preview_payload(account_id: Uuid, promo_id: Uuid) -> JobPayload {
    JobPayload::RenderPreview(RenderPreviewPayload {
        job_id: Uuid::new_v4(),
        account_id,
        promo_id,
        branch_id: None,
        branch_name: None,
    })
}

// ============================================================================
// Enqueue
// ============================================================================

/// Enqueue writes a pending job row and publishes the payload as the
/// message body.
#[test_context(TestHarness)]
#[tokio::test]
async fn test_enqueue_creates_row_and_message(ctx: &mut TestHarness) {
    let account = create_test_account(&ctx.db_pool).await.unwrap();
    let promo = create_test_promo(&ctx.db_pool, account.id).await.unwrap();
    let queue = PostgresJobQueue::new(ctx.db_pool.clone());
    let payload = preview_payload(account.id, promo.id);

    let job_id = Job::enqueue(&ctx.db_pool, &queue, &payload).await.unwrap();
    assert_eq!(job_id, payload.job_id());

    let job = Job::find_by_id(job_id, &ctx.db_pool).await.unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.account_id, account.id);
    assert_eq!(job.payload, serde_json::to_value(&payload).unwrap());
    assert_eq!(job.attempts, 0);
    assert!(job.result.is_none());

    let messages = queue.receive(10, Duration::from_secs(1)).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].body, serde_json::to_value(&payload).unwrap());
}

// ============================================================================
// run_job state machine
// ============================================================================

/// A successful body lands the job in done with its result document and
/// both timestamps stamped.
#[test_context(TestHarness)]
#[tokio::test]
async fn test_run_job_success(ctx: &mut TestHarness) {
    let account = create_test_account(&ctx.db_pool).await.unwrap();
    let promo = create_test_promo(&ctx.db_pool, account.id).await.unwrap();
    let queue = PostgresJobQueue::new(ctx.db_pool.clone());
    let payload = preview_payload(account.id, promo.id);
    let job_id = Job::enqueue(&ctx.db_pool, &queue, &payload).await.unwrap();

    run_job(&ctx.db_pool, job_id, || async {
        Ok(json!({ "s3Key": "assets/x/preview.png" }))
    })
    .await
    .unwrap();

    let job = Job::find_by_id(job_id, &ctx.db_pool).await.unwrap();
    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(job.result, Some(json!({ "s3Key": "assets/x/preview.png" })));
    assert_eq!(job.attempts, 1);
    assert!(job.started_at.is_some());
    assert!(job.completed_at.is_some());
    assert!(job.error_msg.is_none());
}

/// A failing body lands the job in failed with the flattened error chain,
/// and the error propagates to the caller.
#[test_context(TestHarness)]
#[tokio::test]
async fn test_run_job_failure(ctx: &mut TestHarness) {
    let account = create_test_account(&ctx.db_pool).await.unwrap();
    let promo = create_test_promo(&ctx.db_pool, account.id).await.unwrap();
    let queue = PostgresJobQueue::new(ctx.db_pool.clone());
    let payload = preview_payload(account.id, promo.id);
    let job_id = Job::enqueue(&ctx.db_pool, &queue, &payload).await.unwrap();

    let outcome = run_job(&ctx.db_pool, job_id, || async {
        Err(anyhow!("browser crashed").context("rendering preview"))
    })
    .await;
    assert!(outcome.is_err());

    let job = Job::find_by_id(job_id, &ctx.db_pool).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(
        job.error_msg.as_deref(),
        Some("rendering preview: browser crashed")
    );
    assert!(job.completed_at.is_some());
}

/// A redelivered message for an already-terminal job drains without
/// re-running the handler or touching the stored outcome.
#[test_context(TestHarness)]
#[tokio::test]
async fn test_terminal_job_drains_redelivery(ctx: &mut TestHarness) {
    let account = create_test_account(&ctx.db_pool).await.unwrap();
    let promo = create_test_promo(&ctx.db_pool, account.id).await.unwrap();
    let queue = PostgresJobQueue::new(ctx.db_pool.clone());
    let payload = preview_payload(account.id, promo.id);
    let job_id = Job::enqueue(&ctx.db_pool, &queue, &payload).await.unwrap();

    run_job(&ctx.db_pool, job_id, || async { Ok(json!({ "run": 1 })) })
        .await
        .unwrap();

    let calls = AtomicUsize::new(0);
    run_job(&ctx.db_pool, job_id, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({ "run": 2 }))
    })
    .await
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    let job = Job::find_by_id(job_id, &ctx.db_pool).await.unwrap();
    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(job.result, Some(json!({ "run": 1 })));
    assert_eq!(job.attempts, 1);
}

/// A message whose job row is missing is an error, not a silent drop.
#[test_context(TestHarness)]
#[tokio::test]
async fn test_run_job_without_record_errors(ctx: &mut TestHarness) {
    let outcome = run_job(&ctx.db_pool, Uuid::new_v4(), || async { Ok(json!({})) }).await;
    assert!(outcome.is_err());
}

// ============================================================================
// Polling view
// ============================================================================

/// The polling view carries the client-facing field names.
#[test_context(TestHarness)]
#[tokio::test]
async fn test_poll_view_shape(ctx: &mut TestHarness) {
    let account = create_test_account(&ctx.db_pool).await.unwrap();
    let promo = create_test_promo(&ctx.db_pool, account.id).await.unwrap();
    let queue = PostgresJobQueue::new(ctx.db_pool.clone());
    let payload = preview_payload(account.id, promo.id);
    let job_id = Job::enqueue(&ctx.db_pool, &queue, &payload).await.unwrap();

    let view = Job::poll_view(job_id, &ctx.db_pool).await.unwrap().unwrap();
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["type"], json!("render_preview"));
    assert_eq!(json["status"], json!("pending"));
    assert!(json.get("errorMsg").is_some());
    assert!(json.get("startedAt").is_some());

    let missing = Job::poll_view(Uuid::new_v4(), &ctx.db_pool).await.unwrap();
    assert!(missing.is_none());
}

// ============================================================================
// Reconciliation
// ============================================================================

/// Reconcile re-sends messages only for stale pending jobs: fresh pending
/// and terminal rows are left alone.
#[test_context(TestHarness)]
#[tokio::test]
async fn test_reconcile_resends_stale_pending_only(ctx: &mut TestHarness) {
    let account = create_test_account(&ctx.db_pool).await.unwrap();
    let promo = create_test_promo(&ctx.db_pool, account.id).await.unwrap();
    let queue = PostgresJobQueue::new(ctx.db_pool.clone());

    let stale = preview_payload(account.id, promo.id);
    let fresh = preview_payload(account.id, promo.id);
    let done = preview_payload(account.id, promo.id);
    let stale_id = Job::enqueue(&ctx.db_pool, &queue, &stale).await.unwrap();
    Job::enqueue(&ctx.db_pool, &queue, &fresh).await.unwrap();
    let done_id = Job::enqueue(&ctx.db_pool, &queue, &done).await.unwrap();
    run_job(&ctx.db_pool, done_id, || async { Ok(json!({})) })
        .await
        .unwrap();

    // Simulate the crash window: messages lost, stale rows long untouched
    sqlx::query("DELETE FROM queue_messages")
        .execute(&ctx.db_pool)
        .await
        .unwrap();
    sqlx::query("UPDATE jobs SET updated_at = NOW() - INTERVAL '10 minutes' WHERE id IN ($1, $2)")
        .bind(stale_id)
        .bind(done_id)
        .execute(&ctx.db_pool)
        .await
        .unwrap();

    let resent = reconcile_stuck_jobs(&ctx.db_pool, &queue, Duration::from_secs(300))
        .await
        .unwrap();
    assert_eq!(resent, 1);

    let messages = queue.receive(10, Duration::from_secs(1)).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].body, serde_json::to_value(&stale).unwrap());

    // The re-sent row is touched so the next sweep skips it
    let refreshed: bool = sqlx::query_scalar(
        "SELECT updated_at > NOW() - INTERVAL '1 minute' FROM jobs WHERE id = $1",
    )
    .bind(stale_id)
    .fetch_one(&ctx.db_pool)
    .await
    .unwrap();
    assert!(refreshed);
}

//! Job records and the pending -> running -> {done, failed} state machine.
//!
//! A job row is created when work is enqueued and carries the outcome for
//! polling clients. Exactly one terminal transition happens per execution;
//! a redelivered message for an already-terminal job is dropped by
//! [`run_job`] without re-running the handler.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use super::payload::JobPayload;
use super::queue::JobQueue;

/// Upper bound per reconcile sweep, keeps a backlog from flooding the queue
const RECONCILE_BATCH_LIMIT: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    ParseUpload,
    BrandBootstrap,
    ProductUrlScrape,
    RenderPreview,
    RenderPdf,
    RenderSocialImage,
    ExportZip,
    GenerateEmail,
    GenerateCoopReport,
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobType::ParseUpload => "parse_upload",
            JobType::BrandBootstrap => "brand_bootstrap",
            JobType::ProductUrlScrape => "product_url_scrape",
            JobType::RenderPreview => "render_preview",
            JobType::RenderPdf => "render_pdf",
            JobType::RenderSocialImage => "render_social_image",
            JobType::ExportZip => "export_zip",
            JobType::GenerateEmail => "generate_email",
            JobType::GenerateCoopReport => "generate_coop_report",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub account_id: Uuid,
    pub job_type: JobType,
    pub status: JobStatus,
    pub payload: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub error_msg: Option<String>,
    pub attempts: i32,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The subset of a job row exposed to polling clients.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobPollView {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub status: JobStatus,
    pub result: Option<serde_json::Value>,
    pub error_msg: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create the pending job row, then publish its payload to the queue.
    ///
    /// The insert and the send are not atomic. A crash between them leaves a
    /// pending row with no message; [`reconcile_stuck_jobs`] re-sends those.
    pub async fn enqueue(
        pool: &PgPool,
        queue: &dyn JobQueue,
        payload: &JobPayload,
    ) -> Result<Uuid> {
        let job_id = payload.job_id();
        let body = serde_json::to_value(payload)?;

        sqlx::query(
            r#"
            INSERT INTO jobs (id, account_id, job_type, status, payload)
            VALUES ($1, $2, $3, 'pending', $4)
            "#,
        )
        .bind(job_id)
        .bind(payload.account_id())
        .bind(payload.job_type())
        .bind(&body)
        .execute(pool)
        .await?;

        queue.send(body).await?;

        info!(job_id = %job_id, job_type = %payload.job_type(), "enqueued job");
        Ok(job_id)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Job> {
        let job = sqlx::query_as::<_, Job>(
            r#"
            SELECT id, account_id, job_type, status, payload, result, error_msg,
                   attempts, started_at, completed_at, created_at, updated_at
            FROM jobs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(job)
    }

    pub async fn poll_view(id: Uuid, pool: &PgPool) -> Result<Option<JobPollView>> {
        let view = sqlx::query_as::<_, JobPollView>(
            r#"
            SELECT id, job_type, status, result, error_msg, started_at, completed_at
            FROM jobs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(view)
    }

    pub async fn status_of(id: Uuid, pool: &PgPool) -> Result<Option<JobStatus>> {
        let status = sqlx::query_scalar::<_, JobStatus>("SELECT status FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(status)
    }

    /// Transition to running, stamping `started_at` and counting the attempt.
    pub async fn start(id: Uuid, pool: &PgPool) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'running',
                started_at = NOW(),
                attempts = attempts + 1,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            bail!("job {} not found", id);
        }
        Ok(())
    }

    /// Terminal success: store the handler's result document.
    pub async fn complete(id: Uuid, result: &serde_json::Value, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'done',
                result = $2,
                completed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(result)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Terminal failure: store the error message for polling clients.
    pub async fn fail(id: Uuid, error_msg: &str, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'failed',
                error_msg = $2,
                completed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error_msg)
        .execute(pool)
        .await?;

        Ok(())
    }
}

/// Run a job body inside the state machine.
///
/// Terminal jobs are skipped (the redelivery drains without re-running the
/// handler). Otherwise the job is marked running, the body executes, and
/// exactly one terminal transition is recorded. The body's error is returned
/// to the caller so the dispatcher leaves the message for redelivery.
pub async fn run_job<F, Fut>(pool: &PgPool, job_id: Uuid, body: F) -> Result<()>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<serde_json::Value>>,
{
    match Job::status_of(job_id, pool).await? {
        None => bail!("job {} has no record", job_id),
        Some(status) if status.is_terminal() => {
            info!(job_id = %job_id, status = %status, "job already terminal, dropping redelivery");
            return Ok(());
        }
        Some(_) => {}
    }

    Job::start(job_id, pool).await?;

    match body().await {
        Ok(result) => {
            Job::complete(job_id, &result, pool).await?;
            info!(job_id = %job_id, "job done");
            Ok(())
        }
        Err(e) => {
            let message = format!("{:#}", e);
            warn!(job_id = %job_id, error = %message, "job failed");
            Job::fail(job_id, &message, pool).await?;
            Err(e)
        }
    }
}

/// Re-send queue messages for pending jobs that have sat untouched longer
/// than `stale_after`. Covers the enqueue crash window and lost messages.
pub async fn reconcile_stuck_jobs(
    pool: &PgPool,
    queue: &dyn JobQueue,
    stale_after: Duration,
) -> Result<u64> {
    let rows: Vec<(Uuid, serde_json::Value)> = sqlx::query_as(
        r#"
        SELECT id, payload
        FROM jobs
        WHERE status = 'pending'
          AND updated_at < NOW() - ($1 || ' seconds')::INTERVAL
        ORDER BY created_at
        LIMIT $2
        "#,
    )
    .bind(stale_after.as_secs().to_string())
    .bind(RECONCILE_BATCH_LIMIT)
    .fetch_all(pool)
    .await?;

    for (job_id, payload) in &rows {
        queue.send(payload.clone()).await?;
        sqlx::query("UPDATE jobs SET updated_at = NOW() WHERE id = $1")
            .bind(job_id)
            .execute(pool)
            .await?;
        info!(job_id = %job_id, "re-enqueued stale pending job");
    }

    Ok(rows.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(JobStatus::Pending).unwrap(),
            serde_json::json!("pending")
        );
        assert_eq!(
            serde_json::to_value(JobType::RenderSocialImage).unwrap(),
            serde_json::json!("render_social_image")
        );
    }
}

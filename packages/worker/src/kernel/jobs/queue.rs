//! PostgreSQL-backed message queue with at-least-once delivery.
//!
//! Receiving a message starts a visibility lease: `visible_at` is pushed into
//! the future and a fresh receipt handle is issued. A consumer that never
//! deletes the message sees it again after the lease expires, up to
//! `max_receive_count` deliveries, after which the message is parked as
//! dead-lettered. Claims use `FOR UPDATE SKIP LOCKED` so concurrent workers
//! never double-deliver a live lease.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct QueueMessage {
    pub id: Uuid,
    pub body: serde_json::Value,
    /// Rotates on every delivery; delete requires the current one
    pub receipt_handle: Uuid,
    pub receive_count: i32,
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Publish a message body. Returns the message id.
    async fn send(&self, body: serde_json::Value) -> Result<Uuid>;

    /// Long-poll for up to `max_messages` messages, waiting at most `wait`.
    async fn receive(&self, max_messages: i64, wait: Duration) -> Result<Vec<QueueMessage>>;

    /// Acknowledge a delivery. Returns false when the receipt handle is
    /// stale, meaning the lease expired and the message was redelivered.
    async fn delete(&self, message_id: Uuid, receipt_handle: Uuid) -> Result<bool>;

    /// Park a message out of delivery immediately.
    async fn dead_letter(&self, message_id: Uuid, reason: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// How long a claimed message stays invisible to other receivers
    pub visibility_timeout: Duration,
    /// Deliveries before a message is parked as dead-lettered
    pub max_receive_count: i32,
    /// Claim retry cadence while long-polling an empty queue
    pub poll_interval: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            visibility_timeout: Duration::from_secs(120),
            max_receive_count: 5,
            poll_interval: Duration::from_secs(1),
        }
    }
}

pub struct PostgresJobQueue {
    pool: PgPool,
    config: QueueConfig,
}

impl PostgresJobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self::with_config(pool, QueueConfig::default())
    }

    pub fn with_config(pool: PgPool, config: QueueConfig) -> Self {
        Self { pool, config }
    }

    /// Park messages whose deliveries are exhausted. Runs ahead of every
    /// claim so an expired final lease cannot be delivered one extra time.
    async fn park_exhausted(&self) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE queue_messages
            SET dead_lettered_at = NOW(),
                dead_letter_reason = 'max receive count exceeded',
                updated_at = NOW()
            WHERE visible_at <= NOW()
              AND dead_lettered_at IS NULL
              AND receive_count >= max_receive_count
            "#,
        )
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!(
                count = result.rows_affected(),
                "dead-lettered exhausted messages"
            );
        }
        Ok(())
    }

    async fn claim(&self, limit: i64) -> Result<Vec<QueueMessage>> {
        let messages = sqlx::query_as::<_, QueueMessage>(
            r#"
            WITH next_messages AS (
                SELECT id
                FROM queue_messages
                WHERE visible_at <= NOW()
                  AND dead_lettered_at IS NULL
                  AND receive_count < max_receive_count
                ORDER BY created_at
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE queue_messages q
            SET receive_count = q.receive_count + 1,
                receipt_handle = gen_random_uuid(),
                visible_at = NOW() + ($2 || ' milliseconds')::INTERVAL,
                updated_at = NOW()
            FROM next_messages n
            WHERE q.id = n.id
            RETURNING q.id, q.body, q.receipt_handle, q.receive_count
            "#,
        )
        .bind(limit)
        .bind(self.config.visibility_timeout.as_millis().to_string())
        .fetch_all(&self.pool)
        .await?;

        if !messages.is_empty() {
            debug!(count = messages.len(), "claimed queue messages");
        }
        Ok(messages)
    }
}

#[async_trait]
impl JobQueue for PostgresJobQueue {
    async fn send(&self, body: serde_json::Value) -> Result<Uuid> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO queue_messages (body, max_receive_count)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(&body)
        .bind(self.config.max_receive_count)
        .fetch_one(&self.pool)
        .await?;

        debug!(message_id = %id, "sent queue message");
        Ok(id)
    }

    async fn receive(&self, max_messages: i64, wait: Duration) -> Result<Vec<QueueMessage>> {
        let deadline = Instant::now() + wait;
        loop {
            self.park_exhausted().await?;

            let claimed = self.claim(max_messages).await?;
            if !claimed.is_empty() {
                return Ok(claimed);
            }
            if Instant::now() + self.config.poll_interval > deadline {
                return Ok(Vec::new());
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    async fn delete(&self, message_id: Uuid, receipt_handle: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM queue_messages WHERE id = $1 AND receipt_handle = $2",
        )
        .bind(message_id)
        .bind(receipt_handle)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn dead_letter(&self, message_id: Uuid, reason: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE queue_messages
            SET dead_lettered_at = NOW(),
                dead_letter_reason = $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(message_id)
        .bind(reason)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Upload - a spreadsheet file a user pushed into the uploads bucket
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Upload {
    pub id: Uuid,
    pub account_id: Uuid,
    pub promo_id: Option<Uuid>,
    pub s3_key: String,
    pub filename: String,
    pub content_type: Option<String>,
    /// Stamped when a parse job lands the item set
    pub parsed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Upload {
    /// Find upload by ID
    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        let upload = sqlx::query_as::<_, Upload>("SELECT * FROM uploads WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(upload)
    }

    /// Create an upload record
    pub async fn create(
        account_id: Uuid,
        promo_id: Option<Uuid>,
        s3_key: &str,
        filename: &str,
        pool: &PgPool,
    ) -> Result<Self> {
        let upload = sqlx::query_as::<_, Upload>(
            r#"
            INSERT INTO uploads (account_id, promo_id, s3_key, filename)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(account_id)
        .bind(promo_id)
        .bind(s3_key)
        .bind(filename)
        .fetch_one(pool)
        .await?;
        Ok(upload)
    }
}

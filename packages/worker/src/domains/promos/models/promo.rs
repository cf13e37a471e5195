use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Promo - a promotional flyer with line items and branding
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Promo {
    pub id: Uuid,
    pub account_id: Uuid,
    pub title: String,
    pub subhead: Option<String>,
    pub cta: Option<String>,
    pub template_id: String,
    pub status: String, // 'draft', 'ready', 'archived'
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Promo {
    /// Find a promo by ID, scoped to its owning account
    pub async fn find_scoped(id: Uuid, account_id: Uuid, pool: &PgPool) -> Result<Self> {
        let promo = sqlx::query_as::<_, Promo>(
            "SELECT * FROM promos WHERE id = $1 AND account_id = $2",
        )
        .bind(id)
        .bind(account_id)
        .fetch_one(pool)
        .await?;
        Ok(promo)
    }

    /// Mark a promo as ready once its first preview exists
    pub async fn mark_ready(id: Uuid, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE promos SET status = 'ready', updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Create a promo
    pub async fn create(
        account_id: Uuid,
        title: &str,
        subhead: Option<&str>,
        cta: Option<&str>,
        template_id: &str,
        pool: &PgPool,
    ) -> Result<Self> {
        let promo = sqlx::query_as::<_, Promo>(
            r#"
            INSERT INTO promos (account_id, title, subhead, cta, template_id, status)
            VALUES ($1, $2, $3, $4, $5, 'draft')
            RETURNING *
            "#,
        )
        .bind(account_id)
        .bind(title)
        .bind(subhead)
        .bind(cta)
        .bind(template_id)
        .fetch_one(pool)
        .await?;
        Ok(promo)
    }
}

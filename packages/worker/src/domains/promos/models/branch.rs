use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Branch - a physical location of a dealer account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Branch {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub cta: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Branch {
    /// Find a branch by ID, scoped to its owning account
    pub async fn find_scoped(id: Uuid, account_id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        let branch = sqlx::query_as::<_, Branch>(
            "SELECT * FROM branches WHERE id = $1 AND account_id = $2",
        )
        .bind(id)
        .bind(account_id)
        .fetch_optional(pool)
        .await?;
        Ok(branch)
    }

    /// Create a branch
    pub async fn create(
        account_id: Uuid,
        name: &str,
        address: Option<&str>,
        phone: Option<&str>,
        email: Option<&str>,
        cta: Option<&str>,
        pool: &PgPool,
    ) -> Result<Self> {
        let branch = sqlx::query_as::<_, Branch>(
            r#"
            INSERT INTO branches (account_id, name, address, phone, email, cta)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(account_id)
        .bind(name)
        .bind(address)
        .bind(phone)
        .bind(email)
        .bind(cta)
        .fetch_one(pool)
        .await?;
        Ok(branch)
    }
}

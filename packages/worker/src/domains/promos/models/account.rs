use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Account - a dealer tenant
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub website_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Find account by ID
    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(account)
    }

    /// Account name, or None when the account does not exist
    pub async fn name_of(id: Uuid, pool: &PgPool) -> Result<Option<String>> {
        let name = sqlx::query_scalar::<_, String>("SELECT name FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(name)
    }

    /// Create an account
    pub async fn create(name: &str, website_url: Option<&str>, pool: &PgPool) -> Result<Self> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (name, website_url)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(website_url)
        .fetch_one(pool)
        .await?;
        Ok(account)
    }
}

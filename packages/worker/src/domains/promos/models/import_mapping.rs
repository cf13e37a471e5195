use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domains::imports::MappingProfile;

/// ImportMapping - a saved, account-scoped column mapping profile
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ImportMapping {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub mappings: Json<MappingProfile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ImportMapping {
    /// Find a mapping profile by ID, scoped to its owning account
    pub async fn find_scoped(id: Uuid, account_id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        let mapping = sqlx::query_as::<_, ImportMapping>(
            "SELECT * FROM import_mappings WHERE id = $1 AND account_id = $2",
        )
        .bind(id)
        .bind(account_id)
        .fetch_optional(pool)
        .await?;
        Ok(mapping)
    }

    /// Create a mapping profile
    pub async fn create(
        account_id: Uuid,
        name: &str,
        profile: MappingProfile,
        pool: &PgPool,
    ) -> Result<Self> {
        let mapping = sqlx::query_as::<_, ImportMapping>(
            r#"
            INSERT INTO import_mappings (account_id, name, mappings)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(account_id)
        .bind(name)
        .bind(Json(profile))
        .fetch_one(pool)
        .await?;
        Ok(mapping)
    }
}

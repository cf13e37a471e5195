use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// BrandKit - extracted brand signals for an account, one row per account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BrandKit {
    pub id: Uuid,
    pub account_id: Uuid,
    pub logo_url: Option<String>,
    /// Hex colors in priority order: primary, secondary, accent, extras
    pub colors: Vec<String>,
    pub website_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BrandKit {
    /// Find the brand kit for an account
    pub async fn find_by_account(account_id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        let kit = sqlx::query_as::<_, BrandKit>(
            "SELECT * FROM brand_kits WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(pool)
        .await?;
        Ok(kit)
    }

    /// Upsert brand signals. An absent logo or empty color list never
    /// clobbers previously extracted values.
    pub async fn upsert(
        account_id: Uuid,
        logo_url: Option<&str>,
        colors: &[String],
        website_url: &str,
        pool: &PgPool,
    ) -> Result<Self> {
        let kit = sqlx::query_as::<_, BrandKit>(
            r#"
            INSERT INTO brand_kits (account_id, logo_url, colors, website_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (account_id) DO UPDATE SET
                logo_url = COALESCE(EXCLUDED.logo_url, brand_kits.logo_url),
                colors = CASE
                    WHEN cardinality(EXCLUDED.colors) > 0 THEN EXCLUDED.colors
                    ELSE brand_kits.colors
                END,
                website_url = EXCLUDED.website_url,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(account_id)
        .bind(logo_url)
        .bind(colors)
        .bind(website_url)
        .fetch_one(pool)
        .await?;
        Ok(kit)
    }
}

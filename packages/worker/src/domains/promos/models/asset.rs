use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Generated artifact kind. Append-only rows; the newest row of a type is
/// the "current" one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "asset_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Preview,
    Pdf,
    SocialImage,
    EmailHtml,
    Zip,
    CoopReport,
}

impl AssetType {
    /// Directory segment inside the storage key
    pub fn key_segment(self) -> &'static str {
        match self {
            AssetType::Preview => "preview",
            AssetType::Pdf => "pdf",
            AssetType::SocialImage => "social",
            AssetType::EmailHtml => "email",
            AssetType::Zip => "zip",
            AssetType::CoopReport => "coop",
        }
    }

    pub fn file_extension(self) -> &'static str {
        match self {
            AssetType::Preview | AssetType::SocialImage => "png",
            AssetType::Pdf => "pdf",
            AssetType::EmailHtml => "html",
            AssetType::Zip => "zip",
            AssetType::CoopReport => "csv",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            AssetType::Preview | AssetType::SocialImage => "image/png",
            AssetType::Pdf => "application/pdf",
            AssetType::EmailHtml => "text/html",
            AssetType::Zip => "application/zip",
            AssetType::CoopReport => "text/csv",
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AssetType::Preview => "preview",
            AssetType::Pdf => "pdf",
            AssetType::SocialImage => "social_image",
            AssetType::EmailHtml => "email_html",
            AssetType::Zip => "zip",
            AssetType::CoopReport => "coop_report",
        };
        write!(f, "{}", s)
    }
}

/// Asset - a generated artifact stored in the assets bucket
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Asset {
    pub id: Uuid,
    pub account_id: Uuid,
    pub promo_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub asset_type: AssetType,
    pub s3_key: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}

impl Asset {
    /// Record a generated artifact
    pub async fn create(
        account_id: Uuid,
        promo_id: Uuid,
        branch_id: Option<Uuid>,
        asset_type: AssetType,
        s3_key: &str,
        size_bytes: i64,
        pool: &PgPool,
    ) -> Result<Self> {
        let asset = sqlx::query_as::<_, Asset>(
            r#"
            INSERT INTO assets (account_id, promo_id, branch_id, asset_type, s3_key, size_bytes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(account_id)
        .bind(promo_id)
        .bind(branch_id)
        .bind(asset_type)
        .bind(s3_key)
        .bind(size_bytes)
        .fetch_one(pool)
        .await?;
        Ok(asset)
    }

    /// Everything bundled into a ZIP export: all of a promo's assets except
    /// previously generated ZIPs, oldest first.
    pub async fn list_bundle_sources(
        promo_id: Uuid,
        account_id: Uuid,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let assets = sqlx::query_as::<_, Asset>(
            r#"
            SELECT *
            FROM assets
            WHERE promo_id = $1
              AND account_id = $2
              AND asset_type != 'zip'
            ORDER BY created_at ASC
            "#,
        )
        .bind(promo_id)
        .bind(account_id)
        .fetch_all(pool)
        .await?;
        Ok(assets)
    }

    /// Most recent asset of a type for a promo
    pub async fn latest_of_type(
        promo_id: Uuid,
        asset_type: AssetType,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let asset = sqlx::query_as::<_, Asset>(
            r#"
            SELECT *
            FROM assets
            WHERE promo_id = $1
              AND asset_type = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(promo_id)
        .bind(asset_type)
        .fetch_optional(pool)
        .await?;
        Ok(asset)
    }

    /// Count assets of a type for a promo
    pub async fn count_of_type(
        promo_id: Uuid,
        asset_type: AssetType,
        pool: &PgPool,
    ) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM assets WHERE promo_id = $1 AND asset_type = $2",
        )
        .bind(promo_id)
        .bind(asset_type)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Storage key for a new artifact:
    /// `assets/<accountId>/<promoId>/[branches/<branchId>/]<segment>/<timestamp>.<ext>`
    pub fn build_storage_key(
        account_id: Uuid,
        promo_id: Uuid,
        branch_id: Option<Uuid>,
        asset_type: AssetType,
        timestamp_millis: i64,
    ) -> String {
        let branch_segment = branch_id
            .map(|id| format!("branches/{}/", id))
            .unwrap_or_default();
        format!(
            "assets/{}/{}/{}{}/{}.{}",
            account_id,
            promo_id,
            branch_segment,
            asset_type.key_segment(),
            timestamp_millis,
            asset_type.file_extension()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_layout() {
        let account_id = Uuid::nil();
        let promo_id = Uuid::nil();

        let key =
            Asset::build_storage_key(account_id, promo_id, None, AssetType::Preview, 1700000000000);
        assert_eq!(
            key,
            format!("assets/{}/{}/preview/1700000000000.png", account_id, promo_id)
        );

        let branch_id = Uuid::new_v4();
        let key = Asset::build_storage_key(
            account_id,
            promo_id,
            Some(branch_id),
            AssetType::SocialImage,
            1700000000000,
        );
        assert_eq!(
            key,
            format!(
                "assets/{}/{}/branches/{}/social/1700000000000.png",
                account_id, promo_id, branch_id
            )
        );
    }

    #[test]
    fn test_coop_report_uses_short_segment() {
        let key = Asset::build_storage_key(
            Uuid::nil(),
            Uuid::nil(),
            None,
            AssetType::CoopReport,
            42,
        );
        assert!(key.ends_with("/coop/42.csv"));
    }
}

use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// PromoItem - a product line item on a promo
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PromoItem {
    pub id: Uuid,
    pub promo_id: Uuid,
    pub upload_id: Option<Uuid>,
    pub name: String,
    pub price: Decimal,
    pub sku: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub vendor: Option<String>,
    pub image_url: Option<String>,

    // Co-op accrual fields, edited by users after import
    pub coop_vendor: Option<String>,
    pub coop_amount: Option<Decimal>,
    pub coop_note: Option<String>,

    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A normalized item row produced by the column inference engine,
/// not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPromoItem {
    pub name: String,
    pub price: Decimal,
    pub sku: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub vendor: Option<String>,
    pub image_url: Option<String>,
    /// Original spreadsheet row index, preserved through filtering
    pub sort_order: i32,
}

impl PromoItem {
    /// Find item by ID
    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        let item = sqlx::query_as::<_, PromoItem>("SELECT * FROM promo_items WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(item)
    }

    /// All items for a promo in display order
    pub async fn list_for_promo(promo_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        let items = sqlx::query_as::<_, PromoItem>(
            "SELECT * FROM promo_items WHERE promo_id = $1 ORDER BY sort_order ASC",
        )
        .bind(promo_id)
        .fetch_all(pool)
        .await?;
        Ok(items)
    }

    /// Items with a co-op vendor set, for the co-op accrual report
    pub async fn list_coop_for_promo(promo_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        let items = sqlx::query_as::<_, PromoItem>(
            r#"
            SELECT *
            FROM promo_items
            WHERE promo_id = $1
              AND coop_vendor IS NOT NULL
            ORDER BY sort_order ASC
            "#,
        )
        .bind(promo_id)
        .fetch_all(pool)
        .await?;
        Ok(items)
    }

    /// Replace a promo's entire item set in one transaction and stamp the
    /// source upload as parsed.
    ///
    /// Delete-then-insert keeps retries idempotent: a redelivered parse job
    /// rebuilds the same final set instead of appending duplicates.
    pub async fn replace_for_promo(
        promo_id: Uuid,
        upload_id: Uuid,
        items: &[NewPromoItem],
        pool: &PgPool,
    ) -> Result<usize> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM promo_items WHERE promo_id = $1")
            .bind(promo_id)
            .execute(&mut *tx)
            .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO promo_items
                    (promo_id, upload_id, name, price, sku, unit, category, vendor, image_url, sort_order)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(promo_id)
            .bind(upload_id)
            .bind(&item.name)
            .bind(item.price)
            .bind(&item.sku)
            .bind(&item.unit)
            .bind(&item.category)
            .bind(&item.vendor)
            .bind(&item.image_url)
            .bind(item.sort_order)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE uploads SET parsed_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(upload_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(items.len())
    }

    /// Apply scraped product data. A NULL price keeps the current value.
    pub async fn update_scraped(
        id: Uuid,
        name: &str,
        image_url: Option<&str>,
        price: Option<Decimal>,
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE promo_items
            SET name = $2,
                image_url = $3,
                price = COALESCE($4, price),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(image_url)
        .bind(price)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Create a single item (placeholder rows for URL scraping, fixtures)
    pub async fn create(
        promo_id: Uuid,
        name: &str,
        price: Decimal,
        sort_order: i32,
        pool: &PgPool,
    ) -> Result<Self> {
        let item = sqlx::query_as::<_, PromoItem>(
            r#"
            INSERT INTO promo_items (promo_id, name, price, sort_order)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(promo_id)
        .bind(name)
        .bind(price)
        .bind(sort_order)
        .fetch_one(pool)
        .await?;
        Ok(item)
    }

    /// Set co-op fields on an item (fixtures and co-op editing)
    pub async fn set_coop(
        id: Uuid,
        coop_vendor: Option<&str>,
        coop_amount: Option<Decimal>,
        coop_note: Option<&str>,
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE promo_items
            SET coop_vendor = $2,
                coop_amount = $3,
                coop_note = $4,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(coop_vendor)
        .bind(coop_amount)
        .bind(coop_note)
        .execute(pool)
        .await?;
        Ok(())
    }
}

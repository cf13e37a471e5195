//! The transient projection bound into render templates.
//!
//! Built fresh for every render job from the promo's relational data, then
//! serialized (camelCase) into the handlebars context. Never persisted.

use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domains::promos::{Account, Branch, BrandKit, Promo, PromoItem};

/// Brand colors used when the account has no extracted palette.
const DEFAULT_PRIMARY_COLOR: &str = "#1a1a2e";
const DEFAULT_SECONDARY_COLOR: &str = "#e94560";

/// Company name shown when the account row has none.
const DEFAULT_COMPANY_NAME: &str = "My Company";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePromoData {
    pub promo: TemplatePromo,
    pub items: Vec<TemplateItem>,
    pub brand: TemplateBrand,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<TemplateBranch>,
    pub watermark: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePromo {
    pub id: String,
    pub title: String,
    pub subhead: Option<String>,
    /// Promo CTA, falling back to the branch CTA when the promo has none
    pub cta: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateItem {
    pub name: String,
    /// Pre-formatted `$X.XX` display string
    pub price: String,
    pub sku: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub vendor: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateBrand {
    pub logo_url: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateBranch {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub cta: Option<String>,
}

/// Format a price for display.
pub fn format_price(price: Decimal) -> String {
    format!("${:.2}", price)
}

impl TemplatePromoData {
    /// Load everything one render needs. The branch is optional and scoped
    /// to the account; a branch id that does not belong to the account is
    /// treated as absent.
    pub async fn load(
        promo_id: Uuid,
        account_id: Uuid,
        watermark: bool,
        branch_id: Option<Uuid>,
        pool: &PgPool,
    ) -> Result<Self> {
        let promo = Promo::find_scoped(promo_id, account_id, pool).await?;
        let items = PromoItem::list_for_promo(promo_id, pool).await?;
        let brand_kit = BrandKit::find_by_account(account_id, pool).await?;
        let account_name = Account::name_of(account_id, pool).await?;
        let branch = match branch_id {
            Some(branch_id) => Branch::find_scoped(branch_id, account_id, pool).await?,
            None => None,
        };

        let cta = promo
            .cta
            .clone()
            .or_else(|| branch.as_ref().and_then(|b| b.cta.clone()));

        let colors = brand_kit
            .as_ref()
            .map(|kit| kit.colors.clone())
            .unwrap_or_default();

        Ok(Self {
            promo: TemplatePromo {
                id: promo.id.to_string(),
                title: promo.title,
                subhead: promo.subhead,
                cta,
            },
            items: items
                .into_iter()
                .map(|item| TemplateItem {
                    name: item.name,
                    price: format_price(item.price),
                    sku: item.sku,
                    unit: item.unit,
                    category: item.category,
                    vendor: item.vendor,
                    image_url: item.image_url,
                })
                .collect(),
            brand: TemplateBrand {
                logo_url: brand_kit.and_then(|kit| kit.logo_url),
                primary_color: colors
                    .first()
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_PRIMARY_COLOR.to_string()),
                secondary_color: colors
                    .get(1)
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_SECONDARY_COLOR.to_string()),
                name: account_name.unwrap_or_else(|| DEFAULT_COMPANY_NAME.to_string()),
            },
            branch: branch.map(|b| TemplateBranch {
                name: b.name,
                address: b.address,
                phone: b.phone,
                email: b.email,
                cta: b.cta,
            }),
            watermark,
        })
    }
}

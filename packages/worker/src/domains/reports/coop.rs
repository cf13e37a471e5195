//! Co-op accrual report.
//!
//! Vendors reimburse a share of advertising spend for items featured in a
//! promo. The report is a CSV of the promo's items that carry a co-op
//! vendor, with the accrual amount and the share of the sale price it
//! covers.

use anyhow::Result;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::info;

use crate::domains::promos::{Account, Asset, AssetType, Promo, PromoItem};
use crate::kernel::jobs::{run_job, GenerateCoopReportPayload};
use crate::kernel::WorkerDeps;

const CSV_HEADER: [&str; 7] = [
    "Vendor",
    "Product Name",
    "SKU",
    "Price",
    "Co-op Amount",
    "Co-op %",
    "Note",
];

/// Render the co-op rows to CSV bytes. Prices and amounts are two-decimal,
/// the percentage one-decimal and present only when both sides of the
/// division are. A zero price leaves both the price and percentage blank.
fn build_csv(items: &[PromoItem]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for item in items {
        let price = if item.price != Decimal::ZERO {
            format!("{:.2}", item.price)
        } else {
            String::new()
        };
        let amount = item
            .coop_amount
            .map(|a| format!("{:.2}", a))
            .unwrap_or_default();
        let pct = match item.coop_amount {
            Some(a) if item.price != Decimal::ZERO => {
                format!("{:.1}", a / item.price * Decimal::new(100, 0))
            }
            _ => String::new(),
        };

        writer.write_record([
            item.coop_vendor.as_deref().unwrap_or(""),
            item.name.as_str(),
            item.sku.as_deref().unwrap_or(""),
            price.as_str(),
            amount.as_str(),
            pct.as_str(),
            item.coop_note.as_deref().unwrap_or(""),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush co-op csv: {}", e))
}

/// Build the co-op accrual CSV for a promo and store it as an asset.
pub async fn handle_generate_coop_report(
    deps: &WorkerDeps,
    payload: GenerateCoopReportPayload,
) -> Result<()> {
    run_job(&deps.db_pool, payload.job_id, || async {
        let promo = Promo::find_scoped(payload.promo_id, payload.account_id, &deps.db_pool).await?;
        let account_name = Account::name_of(payload.account_id, &deps.db_pool)
            .await?
            .unwrap_or_default();
        let items = PromoItem::list_coop_for_promo(payload.promo_id, &deps.db_pool).await?;

        let csv_bytes = build_csv(&items)?;
        let size_bytes = csv_bytes.len() as i64;

        let s3_key = Asset::build_storage_key(
            payload.account_id,
            payload.promo_id,
            None,
            AssetType::CoopReport,
            Utc::now().timestamp_millis(),
        );
        deps.storage
            .upload(
                &deps.assets_bucket,
                &s3_key,
                csv_bytes,
                AssetType::CoopReport.content_type(),
            )
            .await?;
        Asset::create(
            payload.account_id,
            payload.promo_id,
            None,
            AssetType::CoopReport,
            &s3_key,
            size_bytes,
            &deps.db_pool,
        )
        .await?;

        info!(
            promo_id = %payload.promo_id,
            rows = items.len(),
            key = %s3_key,
            "generated co-op report"
        );
        Ok(json!({
            "s3Key": s3_key,
            "rowCount": items.len(),
            "promoTitle": promo.title,
            "accountName": account_name,
        }))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn coop_item(name: &str, price: Decimal, amount: Option<Decimal>) -> PromoItem {
        PromoItem {
            id: Uuid::new_v4(),
            promo_id: Uuid::new_v4(),
            upload_id: None,
            name: name.to_string(),
            price,
            sku: Some("H-100".to_string()),
            unit: None,
            category: None,
            vendor: None,
            image_url: None,
            coop_vendor: Some("Acme Tools".to_string()),
            coop_amount: amount,
            coop_note: None,
            sort_order: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn csv_lines(items: &[PromoItem]) -> Vec<String> {
        let bytes = build_csv(items).unwrap();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    fn test_header_row() {
        let lines = csv_lines(&[]);
        assert_eq!(lines, vec!["Vendor,Product Name,SKU,Price,Co-op Amount,Co-op %,Note"]);
    }

    #[test]
    fn test_full_row_with_percentage() {
        let item = coop_item(
            "Claw Hammer",
            Decimal::new(2999, 2),
            Some(Decimal::new(750, 2)),
        );
        let lines = csv_lines(&[item]);
        // 7.50 / 29.99 * 100 = 25.008... rounds to one decimal
        assert_eq!(lines[1], "Acme Tools,Claw Hammer,H-100,29.99,7.50,25.0,");
    }

    #[test]
    fn test_comma_in_name_is_quoted() {
        let item = coop_item(
            "Hammer, Claw 16oz",
            Decimal::new(1200, 2),
            Some(Decimal::new(300, 2)),
        );
        let lines = csv_lines(&[item]);
        assert_eq!(
            lines[1],
            "Acme Tools,\"Hammer, Claw 16oz\",H-100,12.00,3.00,25.0,"
        );
    }

    #[test]
    fn test_zero_price_blanks_price_and_percentage() {
        let item = coop_item("Mystery Item", Decimal::ZERO, Some(Decimal::new(500, 2)));
        let lines = csv_lines(&[item]);
        assert_eq!(lines[1], "Acme Tools,Mystery Item,H-100,,5.00,,");
    }

    #[test]
    fn test_missing_amount_blanks_amount_and_percentage() {
        let item = coop_item("Nails", Decimal::new(450, 2), None);
        let lines = csv_lines(&[item]);
        assert_eq!(lines[1], "Acme Tools,Nails,H-100,4.50,,,");
    }
}

//! Spreadsheet imports.
//!
//! An uploaded CSV or Excel file is decoded into rows, columns are resolved
//! to the canonical product fields (saved mapping profile first, header
//! heuristics as fallback), and the promo's item set is replaced wholesale.

pub mod columns;
pub mod sheet;

pub use columns::{
    normalize_rows, parse_price, resolve_field, CanonicalField, MappingProfile, SheetRow,
};
pub use sheet::parse_workbook;

use anyhow::Result;
use serde_json::json;
use tracing::info;

use crate::domains::promos::{ImportMapping, PromoItem};
use crate::kernel::jobs::{run_job, ParseUploadPayload};
use crate::kernel::WorkerDeps;

/// Parse an uploaded spreadsheet and rebuild the promo's items from it.
pub async fn handle_parse_upload(deps: &WorkerDeps, payload: ParseUploadPayload) -> Result<()> {
    run_job(&deps.db_pool, payload.job_id, || async {
        let bytes = deps
            .storage
            .download(&deps.uploads_bucket, &payload.s3_key)
            .await?;
        let rows = parse_workbook(&bytes)?;

        let profile = match payload.mapping_id {
            Some(mapping_id) => {
                ImportMapping::find_scoped(mapping_id, payload.account_id, &deps.db_pool)
                    .await?
                    .map(|mapping| mapping.mappings.0)
            }
            None => None,
        };

        let items = normalize_rows(&rows, profile.as_ref());
        let created =
            PromoItem::replace_for_promo(payload.promo_id, payload.upload_id, &items, &deps.db_pool)
                .await?;

        info!(
            promo_id = %payload.promo_id,
            upload_id = %payload.upload_id,
            rows = rows.len(),
            items = created,
            "imported promo items"
        );
        Ok(json!({ "itemsCreated": created }))
    })
    .await
}

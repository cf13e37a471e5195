//! Asset bundle export.
//!
//! Collects every non-zip asset the promo has generated, downloads each
//! from storage, and packs them into a single deflated archive grouped by
//! asset type.

use std::io::{Cursor, Write as _};

use anyhow::{Context as _, Result};
use chrono::Utc;
use futures::future::try_join_all;
use serde_json::json;
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::domains::promos::{Asset, AssetType};
use crate::kernel::jobs::{run_job, ExportZipPayload};
use crate::kernel::WorkerDeps;

const COMPRESSION_LEVEL: i64 = 6;

/// Archive entry name: the asset type as a folder, the key's basename as
/// the file name.
fn entry_name(asset: &Asset) -> String {
    let filename = asset.s3_key.rsplit('/').next().unwrap_or(&asset.s3_key);
    format!("{}/{}", asset.asset_type, filename)
}

fn build_zip(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL));

    for (name, data) in files {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(data)?;
    }

    let cursor = writer.finish().context("failed to finalize zip")?;
    Ok(cursor.into_inner())
}

/// Bundle the promo's generated assets into one downloadable archive.
pub async fn handle_export_zip(deps: &WorkerDeps, payload: ExportZipPayload) -> Result<()> {
    run_job(&deps.db_pool, payload.job_id, || async {
        let sources =
            Asset::list_bundle_sources(payload.promo_id, payload.account_id, &deps.db_pool).await?;

        let files = try_join_all(sources.iter().map(|asset| async move {
            let data = deps
                .storage
                .download(&deps.assets_bucket, &asset.s3_key)
                .await?;
            anyhow::Ok((entry_name(asset), data))
        }))
        .await?;

        let zip_bytes = build_zip(&files)?;
        let size_bytes = zip_bytes.len() as i64;

        let s3_key = Asset::build_storage_key(
            payload.account_id,
            payload.promo_id,
            None,
            AssetType::Zip,
            Utc::now().timestamp_millis(),
        );
        deps.storage
            .upload(
                &deps.assets_bucket,
                &s3_key,
                zip_bytes,
                AssetType::Zip.content_type(),
            )
            .await?;
        Asset::create(
            payload.account_id,
            payload.promo_id,
            None,
            AssetType::Zip,
            &s3_key,
            size_bytes,
            &deps.db_pool,
        )
        .await?;

        info!(
            promo_id = %payload.promo_id,
            files = sources.len(),
            key = %s3_key,
            "exported asset bundle"
        );
        Ok(json!({
            "s3Key": s3_key,
            "sizeBytes": size_bytes,
            "fileCount": sources.len(),
        }))
    })
    .await
}

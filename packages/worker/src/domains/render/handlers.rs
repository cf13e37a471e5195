//! The four render jobs: preview PNG, print PDF, social square, email HTML.
//!
//! Each handler loads the template projection, binds a template, rasterizes
//! through the headless browser (the email job skips the browser and stores
//! the bound HTML directly), uploads the bytes, and records an asset row.
//! Repeated runs append new asset rows; readers pick the newest per type.

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::domains::promos::{Asset, AssetType, Promo};
use crate::kernel::jobs::{
    run_job, GenerateEmailPayload, RenderPdfPayload, RenderPreviewPayload,
    RenderSocialImagePayload,
};
use crate::kernel::{EmailCopy, WorkerDeps, PREVIEW_VIEWPORT, SOCIAL_VIEWPORT};

use super::template_data::TemplatePromoData;
use super::templates;

/// Upload rendered bytes and record the asset row. Returns the storage key
/// and size for the job result.
async fn store_asset(
    deps: &WorkerDeps,
    account_id: Uuid,
    promo_id: Uuid,
    branch_id: Option<Uuid>,
    asset_type: AssetType,
    bytes: Vec<u8>,
) -> Result<(String, i64)> {
    let size_bytes = bytes.len() as i64;
    let s3_key = Asset::build_storage_key(
        account_id,
        promo_id,
        branch_id,
        asset_type,
        Utc::now().timestamp_millis(),
    );

    deps.storage
        .upload(&deps.assets_bucket, &s3_key, bytes, asset_type.content_type())
        .await?;

    Asset::create(
        account_id,
        promo_id,
        branch_id,
        asset_type,
        &s3_key,
        size_bytes,
        &deps.db_pool,
    )
    .await?;

    Ok((s3_key, size_bytes))
}

/// Screenshot the promo's flyer template at letter proportions. Previews
/// never carry the watermark; the first successful preview flips the promo
/// to 'ready'.
pub async fn handle_render_preview(deps: &WorkerDeps, payload: RenderPreviewPayload) -> Result<()> {
    run_job(&deps.db_pool, payload.job_id, || async {
        let promo = Promo::find_scoped(payload.promo_id, payload.account_id, &deps.db_pool).await?;
        let data = TemplatePromoData::load(
            payload.promo_id,
            payload.account_id,
            false,
            payload.branch_id,
            &deps.db_pool,
        )
        .await?;

        let html = templates::render_flyer(&promo.template_id, &data)?;
        let (width, height) = PREVIEW_VIEWPORT;
        let png = deps.renderer.render_png(&html, width, height).await?;

        let (s3_key, size_bytes) = store_asset(
            deps,
            payload.account_id,
            payload.promo_id,
            payload.branch_id,
            AssetType::Preview,
            png,
        )
        .await?;

        Promo::mark_ready(payload.promo_id, &deps.db_pool).await?;

        info!(
            promo_id = %payload.promo_id,
            template = %promo.template_id,
            key = %s3_key,
            "rendered preview"
        );
        Ok(json!({ "s3Key": s3_key, "sizeBytes": size_bytes }))
    })
    .await
}

/// Render the flyer to a print PDF, watermarked unless the account is paid.
pub async fn handle_render_pdf(deps: &WorkerDeps, payload: RenderPdfPayload) -> Result<()> {
    run_job(&deps.db_pool, payload.job_id, || async {
        let promo = Promo::find_scoped(payload.promo_id, payload.account_id, &deps.db_pool).await?;
        let data = TemplatePromoData::load(
            payload.promo_id,
            payload.account_id,
            payload.watermark,
            payload.branch_id,
            &deps.db_pool,
        )
        .await?;

        let html = templates::render_flyer(&promo.template_id, &data)?;
        let pdf = deps.renderer.render_pdf(&html).await?;

        let (s3_key, size_bytes) = store_asset(
            deps,
            payload.account_id,
            payload.promo_id,
            payload.branch_id,
            AssetType::Pdf,
            pdf,
        )
        .await?;

        info!(
            promo_id = %payload.promo_id,
            key = %s3_key,
            watermark = payload.watermark,
            "rendered pdf"
        );
        Ok(json!({ "s3Key": s3_key, "sizeBytes": size_bytes }))
    })
    .await
}

/// Render the square social image and generate captions in parallel. The
/// captions ride along in the job result; only the image becomes an asset.
pub async fn handle_render_social_image(
    deps: &WorkerDeps,
    payload: RenderSocialImagePayload,
) -> Result<()> {
    run_job(&deps.db_pool, payload.job_id, || async {
        let data = TemplatePromoData::load(
            payload.promo_id,
            payload.account_id,
            payload.watermark,
            payload.branch_id,
            &deps.db_pool,
        )
        .await?;

        let html = templates::render(templates::SOCIAL_TEMPLATE, &data)?;
        let (width, height) = SOCIAL_VIEWPORT;

        let (png, captions) = tokio::join!(
            deps.renderer.render_png(&html, width, height),
            deps.copywriter.social_captions(&data),
        );
        let png = png?;

        let (s3_key, size_bytes) = store_asset(
            deps,
            payload.account_id,
            payload.promo_id,
            payload.branch_id,
            AssetType::SocialImage,
            png,
        )
        .await?;

        info!(promo_id = %payload.promo_id, key = %s3_key, "rendered social image");
        Ok(json!({ "s3Key": s3_key, "sizeBytes": size_bytes, "captions": captions }))
    })
    .await
}

/// Template context for the email render: the promo projection plus the
/// generated copy under an `emailCopy` key.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailTemplateData<'a> {
    #[serde(flatten)]
    data: &'a TemplatePromoData,
    email_copy: &'a EmailCopy,
}

/// Bind the email template with generated copy and store the HTML as-is.
/// No browser involved; email clients render the markup themselves.
pub async fn handle_generate_email(deps: &WorkerDeps, payload: GenerateEmailPayload) -> Result<()> {
    run_job(&deps.db_pool, payload.job_id, || async {
        let data = TemplatePromoData::load(
            payload.promo_id,
            payload.account_id,
            false,
            payload.branch_id,
            &deps.db_pool,
        )
        .await?;

        let email_copy = deps.copywriter.email_copy(&data).await;

        let html = templates::render(
            templates::EMAIL_TEMPLATE,
            &EmailTemplateData {
                data: &data,
                email_copy: &email_copy,
            },
        )?;

        let (s3_key, size_bytes) = store_asset(
            deps,
            payload.account_id,
            payload.promo_id,
            payload.branch_id,
            AssetType::EmailHtml,
            html.into_bytes(),
        )
        .await?;

        info!(
            promo_id = %payload.promo_id,
            key = %s3_key,
            subject = %email_copy.subject,
            "generated email"
        );
        Ok(json!({
            "s3Key": s3_key,
            "sizeBytes": size_bytes,
            "subject": email_copy.subject,
            "preheader": email_copy.preheader,
        }))
    })
    .await
}

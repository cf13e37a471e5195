//! Typed job payloads.
//!
//! The queue message body is the serialized payload tagged by `type`.
//! Dispatch over the closed enum is exhaustive: adding a job type without a
//! handler is a compile error, and a body that does not parse as any variant
//! is dead-lettered instead of silently dropped.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::job::JobType;

/// Queue message body: `{ "type": ..., "jobId": ..., "accountId": ..., ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobPayload {
    ParseUpload(ParseUploadPayload),
    BrandBootstrap(BrandBootstrapPayload),
    ProductUrlScrape(ProductUrlScrapePayload),
    RenderPreview(RenderPreviewPayload),
    RenderPdf(RenderPdfPayload),
    RenderSocialImage(RenderSocialImagePayload),
    ExportZip(ExportZipPayload),
    GenerateEmail(GenerateEmailPayload),
    GenerateCoopReport(GenerateCoopReportPayload),
}

impl JobPayload {
    pub fn job_type(&self) -> JobType {
        match self {
            JobPayload::ParseUpload(_) => JobType::ParseUpload,
            JobPayload::BrandBootstrap(_) => JobType::BrandBootstrap,
            JobPayload::ProductUrlScrape(_) => JobType::ProductUrlScrape,
            JobPayload::RenderPreview(_) => JobType::RenderPreview,
            JobPayload::RenderPdf(_) => JobType::RenderPdf,
            JobPayload::RenderSocialImage(_) => JobType::RenderSocialImage,
            JobPayload::ExportZip(_) => JobType::ExportZip,
            JobPayload::GenerateEmail(_) => JobType::GenerateEmail,
            JobPayload::GenerateCoopReport(_) => JobType::GenerateCoopReport,
        }
    }

    pub fn job_id(&self) -> Uuid {
        match self {
            JobPayload::ParseUpload(p) => p.job_id,
            JobPayload::BrandBootstrap(p) => p.job_id,
            JobPayload::ProductUrlScrape(p) => p.job_id,
            JobPayload::RenderPreview(p) => p.job_id,
            JobPayload::RenderPdf(p) => p.job_id,
            JobPayload::RenderSocialImage(p) => p.job_id,
            JobPayload::ExportZip(p) => p.job_id,
            JobPayload::GenerateEmail(p) => p.job_id,
            JobPayload::GenerateCoopReport(p) => p.job_id,
        }
    }

    pub fn account_id(&self) -> Uuid {
        match self {
            JobPayload::ParseUpload(p) => p.account_id,
            JobPayload::BrandBootstrap(p) => p.account_id,
            JobPayload::ProductUrlScrape(p) => p.account_id,
            JobPayload::RenderPreview(p) => p.account_id,
            JobPayload::RenderPdf(p) => p.account_id,
            JobPayload::RenderSocialImage(p) => p.account_id,
            JobPayload::ExportZip(p) => p.account_id,
            JobPayload::GenerateEmail(p) => p.account_id,
            JobPayload::GenerateCoopReport(p) => p.account_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseUploadPayload {
    pub job_id: Uuid,
    pub account_id: Uuid,
    pub promo_id: Uuid,
    pub upload_id: Uuid,
    pub s3_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandBootstrapPayload {
    pub job_id: Uuid,
    pub account_id: Uuid,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUrlScrapePayload {
    pub job_id: Uuid,
    pub account_id: Uuid,
    pub promo_id: Uuid,
    pub item_id: Uuid,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPreviewPayload {
    pub job_id: Uuid,
    pub account_id: Uuid,
    pub promo_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPdfPayload {
    pub job_id: Uuid,
    pub account_id: Uuid,
    pub promo_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    pub watermark: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSocialImagePayload {
    pub job_id: Uuid,
    pub account_id: Uuid,
    pub promo_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    pub watermark: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportZipPayload {
    pub job_id: Uuid,
    pub account_id: Uuid,
    pub promo_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateEmailPayload {
    pub job_id: Uuid,
    pub account_id: Uuid,
    pub promo_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCoopReportPayload {
    pub job_id: Uuid,
    pub account_id: Uuid,
    pub promo_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_body_shape() {
        let payload = JobPayload::ParseUpload(ParseUploadPayload {
            job_id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            promo_id: Uuid::new_v4(),
            upload_id: Uuid::new_v4(),
            s3_key: "uploads/a/items.csv".to_string(),
            mapping_id: None,
        });

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "parse_upload");
        assert!(json.get("jobId").is_some());
        assert!(json.get("accountId").is_some());
        assert_eq!(json["s3Key"], "uploads/a/items.csv");
        // Absent optionals are omitted entirely, not serialized as null
        assert!(json.get("mappingId").is_none());
    }

    #[test]
    fn test_round_trip_with_watermark() {
        let payload = JobPayload::RenderPdf(RenderPdfPayload {
            job_id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            promo_id: Uuid::new_v4(),
            branch_id: Some(Uuid::new_v4()),
            branch_name: Some("Downtown".to_string()),
            watermark: true,
        });

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "render_pdf");
        assert_eq!(json["watermark"], true);

        let back: JobPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_unknown_type_fails_to_parse() {
        let body = serde_json::json!({
            "type": "mystery_job",
            "jobId": Uuid::new_v4(),
            "accountId": Uuid::new_v4(),
        });

        assert!(serde_json::from_value::<JobPayload>(body).is_err());
    }

    #[test]
    fn test_job_type_mapping() {
        let payload = JobPayload::ExportZip(ExportZipPayload {
            job_id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            promo_id: Uuid::new_v4(),
        });

        assert_eq!(payload.job_type(), JobType::ExportZip);
        assert_eq!(payload.job_type().to_string(), "export_zip");
    }
}

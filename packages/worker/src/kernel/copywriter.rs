//! Best-effort generated marketing copy.
//!
//! Copy generation is never a hard dependency of a render job: a missing
//! credential, a failed call, or an unparsable response all degrade to
//! empty strings and the owning job still completes.

use async_trait::async_trait;
use gemini_client::GeminiClient;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domains::render::TemplatePromoData;

/// Model used for captions and email copy.
const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";

/// Items included in the prompt summary.
const SUMMARY_ITEM_LIMIT: usize = 8;

/// Per-network captions for the social image job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialCaptions {
    #[serde(default)]
    pub facebook: String,
    #[serde(default)]
    pub instagram: String,
    #[serde(default)]
    pub linkedin: String,
}

/// Subject line, preheader, and intro body for the email job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailCopy {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub preheader: String,
    #[serde(default)]
    pub body_html: String,
}

/// Generated-copy operations. Infallible by contract: implementations
/// return empty-string structures instead of erroring.
#[async_trait]
pub trait BaseCopywriter: Send + Sync {
    async fn social_captions(&self, data: &TemplatePromoData) -> SocialCaptions;
    async fn email_copy(&self, data: &TemplatePromoData) -> EmailCopy;
}

/// Copywriter used when no API credential is configured.
pub struct NoopCopywriter;

#[async_trait]
impl BaseCopywriter for NoopCopywriter {
    async fn social_captions(&self, _data: &TemplatePromoData) -> SocialCaptions {
        SocialCaptions::default()
    }

    async fn email_copy(&self, _data: &TemplatePromoData) -> EmailCopy {
        EmailCopy::default()
    }
}

/// Gemini-backed copywriter.
pub struct GeminiCopywriter {
    client: GeminiClient,
    model: String,
}

impl GeminiCopywriter {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// One strict-JSON call. Network, API, and parse failures all collapse
    /// to `None`; markdown-fenced output is a parse failure, not something
    /// to repair.
    async fn generate<T: serde::de::DeserializeOwned>(&self, prompt: &str) -> Option<T> {
        let text = match self.client.generate_text(&self.model, prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "copy generation call failed");
                return None;
            }
        };

        match serde_json::from_str(text.trim()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(error = %e, "copy generation returned non-JSON output");
                None
            }
        }
    }
}

#[async_trait]
impl BaseCopywriter for GeminiCopywriter {
    async fn social_captions(&self, data: &TemplatePromoData) -> SocialCaptions {
        let prompt = social_captions_prompt(data);
        self.generate(&prompt).await.unwrap_or_default()
    }

    async fn email_copy(&self, data: &TemplatePromoData) -> EmailCopy {
        let prompt = email_copy_prompt(data);
        self.generate(&prompt).await.unwrap_or_default()
    }
}

/// Compact textual summary of a promo for prompting.
pub fn build_promo_summary(data: &TemplatePromoData) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Company: {}", data.brand.name));
    lines.push(format!("Promo title: {}", data.promo.title));
    if let Some(subhead) = &data.promo.subhead {
        lines.push(format!("Subhead: {}", subhead));
    }
    if let Some(cta) = &data.promo.cta {
        lines.push(format!("CTA: {}", cta));
    }
    lines.push("Items:".to_string());
    for item in data.items.iter().take(SUMMARY_ITEM_LIMIT) {
        match &item.unit {
            Some(unit) => lines.push(format!("- {}: {} / {}", item.name, item.price, unit)),
            None => lines.push(format!("- {}: {}", item.name, item.price)),
        }
    }
    lines.join("\n")
}

fn social_captions_prompt(data: &TemplatePromoData) -> String {
    format!(
        "You write social media copy for local retail dealers.\n\n{}\n\n\
         Write three captions promoting this sale. Respond with ONLY a JSON object, \
         no markdown fences, exactly this shape:\n\
         {{\"facebook\": \"...\", \"instagram\": \"...\", \"linkedin\": \"...\"}}\n\
         Keep each caption under 60 words. Facebook warm and local, Instagram \
         punchy with at most 3 hashtags, LinkedIn professional.",
        build_promo_summary(data)
    )
}

fn email_copy_prompt(data: &TemplatePromoData) -> String {
    format!(
        "You write promotional emails for local retail dealers.\n\n{}\n\n\
         Respond with ONLY a JSON object, no markdown fences, exactly this shape:\n\
         {{\"subject\": \"...\", \"preheader\": \"...\", \"bodyHtml\": \"...\"}}\n\
         Subject under 60 characters, preheader under 100 characters, bodyHtml one \
         short intro paragraph of simple HTML (p and strong tags only).",
        build_promo_summary(data)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::render::{TemplateBrand, TemplateItem, TemplatePromo};

    fn sample_data(item_count: usize) -> TemplatePromoData {
        TemplatePromoData {
            promo: TemplatePromo {
                id: "p1".to_string(),
                title: "Spring Sale".to_string(),
                subhead: Some("One week only".to_string()),
                cta: None,
            },
            items: (0..item_count)
                .map(|i| TemplateItem {
                    name: format!("Item {}", i),
                    price: "$9.99".to_string(),
                    sku: None,
                    unit: Some("each".to_string()),
                    category: None,
                    vendor: None,
                    image_url: None,
                })
                .collect(),
            brand: TemplateBrand {
                logo_url: None,
                primary_color: "#1a1a2e".to_string(),
                secondary_color: "#e94560".to_string(),
                name: "Acme Hardware".to_string(),
            },
            branch: None,
            watermark: false,
        }
    }

    #[test]
    fn test_summary_caps_items() {
        let summary = build_promo_summary(&sample_data(12));

        assert!(summary.contains("Company: Acme Hardware"));
        assert!(summary.contains("Subhead: One week only"));
        assert!(!summary.contains("CTA:"));
        assert!(summary.contains("- Item 7: $9.99 / each"));
        assert!(!summary.contains("Item 8"));
    }

    #[tokio::test]
    async fn test_noop_copywriter_returns_empty() {
        let data = sample_data(1);

        let captions = NoopCopywriter.social_captions(&data).await;
        assert_eq!(captions, SocialCaptions::default());

        let email = NoopCopywriter.email_copy(&data).await;
        assert_eq!(email.subject, "");
        assert_eq!(email.body_html, "");
    }

    #[test]
    fn test_partial_json_fills_missing_fields() {
        let parsed: SocialCaptions =
            serde_json::from_str(r#"{"facebook": "Big sale!"}"#).unwrap();

        assert_eq!(parsed.facebook, "Big sale!");
        assert_eq!(parsed.instagram, "");
        assert_eq!(parsed.linkedin, "");
    }

    #[test]
    fn test_fenced_output_is_rejected() {
        let fenced = "```json\n{\"facebook\": \"x\"}\n```";
        assert!(serde_json::from_str::<SocialCaptions>(fenced).is_err());
    }
}

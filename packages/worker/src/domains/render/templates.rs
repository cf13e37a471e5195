//! Template registry and HTML binding.
//!
//! Templates are embedded at compile time and compiled per render, which
//! keeps the engine stateless. The only custom helper is `or`, a value
//! fallback (`{{or promo.cta "Shop Now"}}`) rendering its first truthy
//! argument.

use anyhow::{Context as _, Result};
use handlebars::{Context, Handlebars, Helper, HelperResult, JsonRender, Output, RenderContext};
use lazy_static::lazy_static;
use rust_embed::RustEmbed;
use serde::Serialize;
use serde_json::Value;

use super::template_data::TemplatePromoData;

/// Flyer template metadata surfaced to template pickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub preview_bg_color: &'static str,
}

/// Flyer templates in display order; the first is the default.
pub const TEMPLATES: [TemplateDefinition; 3] = [
    TemplateDefinition {
        id: "classic",
        name: "Classic Grid",
        description: "Clean grid layout with logo header",
        preview_bg_color: "#1a1a2e",
    },
    TemplateDefinition {
        id: "modern",
        name: "Modern Stripe",
        description: "Bold color stripe with product cards",
        preview_bg_color: "#e94560",
    },
    TemplateDefinition {
        id: "bold",
        name: "Bold Promo",
        description: "High-contrast promotional layout",
        preview_bg_color: "#16213e",
    },
];

/// Template bound for the social image render.
pub const SOCIAL_TEMPLATE: &str = "social-square";

/// Template bound for the email render.
pub const EMAIL_TEMPLATE: &str = "email";

/// Resolve a flyer template id; unknown ids fall back to the default.
pub fn get_template(id: &str) -> &'static TemplateDefinition {
    TEMPLATES
        .iter()
        .find(|t| t.id == id)
        .unwrap_or(&TEMPLATES[0])
}

#[derive(RustEmbed)]
#[folder = "templates"]
struct TemplateAssets;

lazy_static! {
    static ref ENGINE: Handlebars<'static> = {
        let mut handlebars = Handlebars::new();
        handlebars.register_helper("or", Box::new(or_helper));
        handlebars
    };
}

/// Bind data into an embedded template by name.
pub fn render(template_name: &str, data: &impl Serialize) -> Result<String> {
    let path = format!("{}.hbs", template_name);
    let file =
        TemplateAssets::get(&path).with_context(|| format!("unknown template {}", template_name))?;
    let source = std::str::from_utf8(file.data.as_ref())
        .with_context(|| format!("template {} is not utf-8", template_name))?;

    ENGINE
        .render_template(source, data)
        .with_context(|| format!("failed to render template {}", template_name))
}

/// Bind promo data into a flyer template; unknown ids use the default.
pub fn render_flyer(template_id: &str, data: &TemplatePromoData) -> Result<String> {
    render(get_template(template_id).id, data)
}

// JS-style truthiness, so empty strings fall through like template authors
// expect
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// `{{or a b}}` renders the first truthy argument.
fn or_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let first = h.param(0).map(|p| p.value().clone()).unwrap_or(Value::Null);
    let second = h.param(1).map(|p| p.value().clone()).unwrap_or(Value::Null);

    let winner = if is_truthy(&first) { first } else { second };
    out.write(&winner.render())?;
    Ok(())
}

//! Asset rendering.
//!
//! Promo data is projected into a template context, bound into an embedded
//! handlebars template, and turned into PNG/PDF bytes by the headless
//! browser (or stored as HTML for the email job).

pub mod handlers;
pub mod template_data;
pub mod templates;

pub use handlers::{
    handle_generate_email, handle_render_pdf, handle_render_preview, handle_render_social_image,
};
pub use template_data::{
    format_price, TemplateBrand, TemplateBranch, TemplateItem, TemplatePromo, TemplatePromoData,
};
pub use templates::{get_template, render, render_flyer, TemplateDefinition, TEMPLATES};

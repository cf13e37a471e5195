//! Brand bootstrap: scrape a company site for a logo and color palette.
//!
//! Everything here is best-effort extraction from third-party markup. The
//! primary page fetch failing fails the job; every secondary signal (the
//! stylesheet, the favicon probe, re-hosting the logo) degrades silently.

use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;

use super::color::refine_palette;
use crate::domains::promos::BrandKit;
use crate::kernel::jobs::{run_job, BrandBootstrapPayload};
use crate::kernel::WorkerDeps;

/// Cap on the landing-page fetch.
const PRIMARY_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Cap on the stylesheet fetch and the favicon probe.
const SECONDARY_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Palette size cap.
const MAX_COLORS: usize = 5;

lazy_static! {
    // 6-digit hex literals as they appear in raw CSS text
    static ref HEX_LITERAL: Regex = Regex::new(r"#[0-9a-fA-F]{6}").unwrap();
    static ref SIX_DIGIT_HEX: Regex = Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap();
}

/// Signals pulled out of the landing page markup in one parse.
#[derive(Debug, Default)]
struct PageSignals {
    logo_url: Option<String>,
    theme_color: Option<String>,
    stylesheet_url: Option<String>,
}

/// Scrape a company URL and upsert the account's brand kit.
pub async fn handle_brand_bootstrap(
    deps: &WorkerDeps,
    payload: BrandBootstrapPayload,
) -> Result<()> {
    run_job(&deps.db_pool, payload.job_id, || async {
        let html = deps
            .fetcher
            .fetch_text(&payload.url, PRIMARY_FETCH_TIMEOUT)
            .await?;

        let signals = extract_page_signals(&html, &payload.url);

        let mut logo_url = signals.logo_url;
        if logo_url.is_none() {
            logo_url = probe_favicon(deps, &payload.url).await;
        }

        let mut colors = Vec::new();
        if let Some(theme_color) = signals.theme_color {
            colors.push(theme_color);
        }
        if let Some(stylesheet_url) = &signals.stylesheet_url {
            for color in stylesheet_colors(deps, stylesheet_url).await {
                if !colors.contains(&color) {
                    colors.push(color);
                }
            }
        }
        colors.truncate(MAX_COLORS);
        let colors = refine_palette(&colors);

        if let Some(external_url) = &logo_url {
            if let Some(hosted) = rehost_logo(deps, &payload, external_url).await {
                logo_url = Some(hosted);
            }
        }

        BrandKit::upsert(
            payload.account_id,
            logo_url.as_deref(),
            &colors,
            &payload.url,
            &deps.db_pool,
        )
        .await?;

        info!(
            account_id = %payload.account_id,
            logo_found = logo_url.is_some(),
            colors = colors.len(),
            "brand kit updated"
        );
        Ok(json!({
            "logoUrl": logo_url,
            "colors": colors,
            "websiteUrl": payload.url,
        }))
    })
    .await
}

/// Parse the page once and pull every signal out as owned strings.
fn extract_page_signals(html: &str, base_url: &str) -> PageSignals {
    let document = Html::parse_document(html);

    PageSignals {
        logo_url: extract_logo(&document, base_url),
        theme_color: extract_theme_color(&document),
        stylesheet_url: extract_first_stylesheet(&document, base_url),
    }
}

/// Logo candidates in priority order; the first hit wins.
fn extract_logo(document: &Html, base_url: &str) -> Option<String> {
    logo_img(document)
        .or_else(|| link_href(document, r#"link[rel~="icon"][type="image/png"]"#))
        .or_else(|| meta_content(document, r#"meta[property="og:image"]"#))
        .or_else(|| link_href(document, r#"link[rel="apple-touch-icon"]"#))
        .map(|raw| resolve_url(&raw, base_url))
}

/// First `<img>` whose src or alt mentions "logo".
fn logo_img(document: &Html) -> Option<String> {
    let selector = Selector::parse("img").ok()?;
    document.select(&selector).find_map(|el| {
        let src = el.value().attr("src")?;
        let alt = el.value().attr("alt").unwrap_or("");
        if src.to_lowercase().contains("logo") || alt.to_lowercase().contains("logo") {
            Some(src.to_string())
        } else {
            None
        }
    })
}

fn link_href(document: &Html, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("href"))
        .map(|href| href.to_string())
        .filter(|href| !href.is_empty())
}

fn meta_content(document: &Html, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|content| content.to_string())
        .filter(|content| !content.is_empty())
}

fn extract_theme_color(document: &Html) -> Option<String> {
    meta_content(document, r#"meta[name="theme-color"]"#)
        .filter(|color| SIX_DIGIT_HEX.is_match(color))
}

fn extract_first_stylesheet(document: &Html, base_url: &str) -> Option<String> {
    link_href(document, r#"link[rel="stylesheet"]"#).map(|href| resolve_url(&href, base_url))
}

/// Resolve a possibly-relative URL against the page it came from. Falls
/// back to the raw value when the base itself does not parse.
fn resolve_url(raw: &str, base: &str) -> String {
    match Url::parse(base).and_then(|base| base.join(raw)) {
        Ok(url) => url.to_string(),
        Err(_) => raw.to_string(),
    }
}

/// HEAD `/favicon.ico` and accept it as a logo only when the server reports
/// an image content type.
async fn probe_favicon(deps: &WorkerDeps, base_url: &str) -> Option<String> {
    let favicon_url = resolve_url("/favicon.ico", base_url);
    match deps
        .fetcher
        .head_content_type(&favicon_url, SECONDARY_FETCH_TIMEOUT)
        .await
    {
        Ok(Some(content_type)) if content_type.starts_with("image/") => Some(favicon_url),
        Ok(_) => None,
        Err(e) => {
            debug!(url = %favicon_url, error = %e, "favicon probe failed");
            None
        }
    }
}

/// Scan the first stylesheet's raw text for hex literals, deduplicated in
/// order of appearance. Fetch failures skip the palette source entirely.
async fn stylesheet_colors(deps: &WorkerDeps, url: &str) -> Vec<String> {
    let css = match deps.fetcher.fetch_text(url, SECONDARY_FETCH_TIMEOUT).await {
        Ok(css) => css,
        Err(e) => {
            debug!(url = %url, error = %e, "stylesheet fetch failed, skipping css colors");
            return Vec::new();
        }
    };

    let mut colors = Vec::new();
    for m in HEX_LITERAL.find_iter(&css) {
        let color = m.as_str().to_string();
        if !colors.contains(&color) {
            colors.push(color);
            if colors.len() == MAX_COLORS {
                break;
            }
        }
    }
    colors
}

/// Copy the winning logo into our own storage so it survives the source
/// site changing. Best-effort: any failure keeps the external URL.
async fn rehost_logo(
    deps: &WorkerDeps,
    payload: &BrandBootstrapPayload,
    logo_url: &str,
) -> Option<String> {
    let body = match deps
        .fetcher
        .fetch_bytes(logo_url, PRIMARY_FETCH_TIMEOUT)
        .await
    {
        Ok(body) => body,
        Err(e) => {
            warn!(url = %logo_url, error = %e, "logo download failed, keeping external url");
            return None;
        }
    };

    let key = format!(
        "brand-logos/{}/logo-{}.{}",
        payload.account_id,
        Utc::now().timestamp_millis(),
        extension_for(body.content_type.as_deref())
    );
    let content_type = body
        .content_type
        .clone()
        .unwrap_or_else(|| "image/png".to_string());

    match deps
        .storage
        .upload(&deps.assets_bucket, &key, body.bytes, &content_type)
        .await
    {
        Ok(()) => Some(deps.storage.public_url(&deps.assets_bucket, &key)),
        Err(e) => {
            warn!(key = %key, error = %e, "logo re-host failed, keeping external url");
            None
        }
    }
}

/// File extension by reported content type; unrecognized types store as png.
fn extension_for(content_type: Option<&str>) -> &'static str {
    match content_type {
        Some(ct) if ct.contains("svg") => "svg",
        Some(ct) if ct.contains("jpeg") || ct.contains("jpg") => "jpg",
        _ => "png",
    }
}

//! Product URL scrape: fill a placeholder item from a product page.
//!
//! Signals that fail to resolve fall back to the item's current values, so
//! a sparse page never wipes data a user already has.

use std::time::Duration;

use anyhow::Result;
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use serde_json::json;
use tracing::info;
use url::Url;

use crate::domains::promos::PromoItem;
use crate::kernel::jobs::{run_job, ProductUrlScrapePayload};
use crate::kernel::WorkerDeps;

/// Cap on the product-page fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Meta-tag price sources in priority order.
const PRICE_SELECTORS: [&str; 2] = [
    r#"meta[property="product:price:amount"]"#,
    r#"meta[property="og:price:amount"]"#,
];

/// What one parse of the product page yields.
#[derive(Debug)]
struct ProductSignals {
    title: String,
    image_url: Option<String>,
    price: Option<Decimal>,
}

/// Scrape a product page and update the referenced item in place.
pub async fn handle_product_url_scrape(
    deps: &WorkerDeps,
    payload: ProductUrlScrapePayload,
) -> Result<()> {
    run_job(&deps.db_pool, payload.job_id, || async {
        let html = deps.fetcher.fetch_text(&payload.url, FETCH_TIMEOUT).await?;
        let signals = extract_product_signals(&html, &payload.url);

        // Load the current row so unresolved signals keep existing data
        let existing = PromoItem::find_by_id(payload.item_id, &deps.db_pool).await?;

        let name = if !signals.title.is_empty() {
            signals.title.clone()
        } else if !existing.name.is_empty() {
            existing.name.clone()
        } else {
            "Product".to_string()
        };
        let image_url = signals.image_url.clone().or(existing.image_url);

        PromoItem::update_scraped(
            payload.item_id,
            &name,
            image_url.as_deref(),
            signals.price,
            &deps.db_pool,
        )
        .await?;

        info!(
            item_id = %payload.item_id,
            title_found = !signals.title.is_empty(),
            image_found = signals.image_url.is_some(),
            price_found = signals.price.is_some(),
            "product page scraped"
        );
        Ok(json!({ "title": signals.title, "imageUrl": signals.image_url }))
    })
    .await
}

fn extract_product_signals(html: &str, base_url: &str) -> ProductSignals {
    let document = Html::parse_document(html);

    let title = meta_content(&document, r#"meta[property="og:title"]"#)
        .or_else(|| element_text(&document, "title"))
        .or_else(|| element_text(&document, "h1"))
        .unwrap_or_default()
        .trim()
        .to_string();

    let image_url = meta_content(&document, r#"meta[property="og:image"]"#)
        .map(|raw| resolve_url(&raw, base_url));

    // A price is applied only when it parses and is strictly positive
    let price = PRICE_SELECTORS
        .iter()
        .find_map(|selector| meta_content(&document, selector))
        .and_then(|raw| raw.trim().parse::<Decimal>().ok())
        .filter(|price| *price > Decimal::ZERO);

    ProductSignals {
        title,
        image_url,
        price,
    }
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

fn element_text(document: &Html, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>())
        .filter(|text| !text.is_empty())
}

fn resolve_url(raw: &str, base: &str) -> String {
    match Url::parse(base).and_then(|base| base.join(raw)) {
        Ok(url) => url.to_string(),
        Err(_) => raw.to_string(),
    }
}

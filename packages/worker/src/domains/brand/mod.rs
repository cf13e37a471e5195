//! Brand extraction: scraping third-party pages for logos, palettes, and
//! product data.

pub mod bootstrap;
pub mod color;
pub mod product_scrape;

pub use bootstrap::handle_brand_bootstrap;
pub use color::{
    adjust_for_contrast, contrast_ratio, hex_to_rgb, hsl_to_rgb, refine_palette,
    relative_luminance, rgb_to_hex, rgb_to_hsl, shift_lightness, Background,
};
pub use product_scrape::handle_product_url_scrape;

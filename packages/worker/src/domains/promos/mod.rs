//! Promo domain models shared by every handler.

pub mod models;

pub use models::{
    Account, Asset, AssetType, Branch, BrandKit, ImportMapping, NewPromoItem, Promo, PromoItem,
    Upload,
};

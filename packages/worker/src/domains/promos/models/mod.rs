pub mod account;
pub mod asset;
pub mod branch;
pub mod brand_kit;
pub mod import_mapping;
pub mod promo;
pub mod promo_item;
pub mod upload;

pub use account::Account;
pub use asset::{Asset, AssetType};
pub use branch::Branch;
pub use brand_kit::BrandKit;
pub use import_mapping::ImportMapping;
pub use promo::Promo;
pub use promo_item::{NewPromoItem, PromoItem};
pub use upload::Upload;

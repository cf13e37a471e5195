// Business domains
pub mod brand;
pub mod imports;
pub mod promos;
pub mod render;
pub mod reports;

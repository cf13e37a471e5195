//! Reporting exports: the co-op accrual CSV and the all-assets ZIP bundle.

pub mod coop;
pub mod zip;

pub use coop::handle_generate_coop_report;
pub use zip::handle_export_zip;

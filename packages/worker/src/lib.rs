// Promoforge worker
//
// This crate is the asynchronous job pipeline behind the promo builder:
// it drains the job queue and turns typed job requests into side effects
// (spreadsheet imports, brand scraping, headless-browser renders, report
// and bundle generation), tracking each job through the pending → running →
// done/failed state machine that clients poll.

pub mod config;
pub mod domains;
pub mod kernel;

pub use config::Config;

//! HTTP handlers for the Sieve diagnostics API.
//!
//! - `health`: liveness
//! - `cache`: filter cache contents and statistics

pub mod cache;
pub mod health;

pub use cache::{cache_contents, cache_stats};
pub use health::health_check;

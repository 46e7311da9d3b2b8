//! Data layer of the analytics pipeline.
//!
//! Reads JSON Lines tolerantly, normalizes fetched blobs into JSON Lines,
//! accumulates per-day and per-type statistics and renders the report.

pub mod aggregator;
pub mod normalize;
pub mod reader;
pub mod report;

pub use analytics_core as core;

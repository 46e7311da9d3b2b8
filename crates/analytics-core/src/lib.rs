//! Shared building blocks for the site analytics pipeline.
//!
//! Error type, record and event models, timestamp resolution and
//! command-line settings used by both the retriever and the aggregator.

pub mod error;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{AnalyticsError, Result};

//! Data ingestion for the dcmap system.
//!
//! This crate handles:
//! - Fetching vantage point reports over HTTP
//! - Parsing report bodies into measurements
//! - Merging reports into per-subnet latency profiles

pub mod aggregator;
pub mod source;

pub use aggregator::aggregate;
pub use source::{collect_reports, parse_report, FetchOutcome, HttpSource, MeasurementSource};

//! Result output for the dcmap system.
//!
//! This crate provides:
//! - Grouping of DC assignments by serving DC
//! - Run summary and confidence counts
//! - JSON assignment document and per-DC routing rule files

pub mod report;
pub mod writer;

pub use report::{AssignmentReport, ConfidenceCounts, DcGroups, SubnetRecord, Summary};
pub use writer::{rule_line, ReportWriter};

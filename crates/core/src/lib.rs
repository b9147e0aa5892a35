//! Core types and configuration for the dcmap system.
//!
//! This crate provides shared types used across all other crates:
//! - Measurement types (vantage point reports, per-subnet profiles)
//! - DC assignment results
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, Credentials, DcLocationMap};
pub use error::{Error, Result};
pub use types::*;

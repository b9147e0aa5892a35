//! Datacenter assignment for the dcmap system.
//!
//! Decides, per subnet, which datacenter serves it from the latencies seen
//! at each vantage point, and how confident that decision is.

pub mod classifier;

pub use classifier::{DcClassifier, DEFAULT_LOW_LATENCY_THRESHOLD_MS};

//! Core data types for the dcmap system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Latency in milliseconds.
pub type LatencyMs = f64;

/// Label used for subnets without a single home DC.
pub const UNDEFINED_DC: &str = "Undefined";

/// A single latency observation of one subnet, as reported by a vantage point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubnetMeasurement {
    /// Subnet in CIDR notation.
    pub subnet: String,
    /// Observed latency (ms).
    #[serde(rename = "latency")]
    pub latency_ms: LatencyMs,
    /// Measurement method tag (e.g. "icmp", "tcp").
    pub method: String,
    /// Whether the probe target answered.
    pub reachable: bool,
    /// Address that was probed inside the subnet.
    pub test_ip: String,
}

/// All measurements from one vantage point for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointReport {
    /// Vantage point location tag (e.g. "SG").
    pub location: String,
    /// When the vantage point produced the report.
    pub timestamp: DateTime<Utc>,
    /// Measurements in the order the vantage point listed them.
    pub subnets: Vec<SubnetMeasurement>,
}

/// Per-subnet view of latencies keyed by vantage point location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubnetLatencyProfile {
    /// Subnet in CIDR notation.
    pub subnet: String,
    /// Latency by vantage point location. Absent key means no data.
    pub latencies: BTreeMap<String, LatencyMs>,
}

impl SubnetLatencyProfile {
    /// Create an empty profile for a subnet.
    pub fn new(subnet: impl Into<String>) -> Self {
        Self {
            subnet: subnet.into(),
            latencies: BTreeMap::new(),
        }
    }

    /// Record the latency seen from a vantage point, replacing any earlier value.
    pub fn record(&mut self, location: impl Into<String>, latency_ms: LatencyMs) {
        self.latencies.insert(location.into(), latency_ms);
    }

    /// Latency seen from a location, if it reported this subnet.
    #[inline]
    pub fn latency_at(&self, location: &str) -> Option<LatencyMs> {
        self.latencies.get(location).copied()
    }

    /// Number of vantage points that reported this subnet.
    #[inline]
    pub fn len(&self) -> usize {
        self.latencies.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.latencies.is_empty()
    }
}

/// Certainty attached to a DC assignment.
///
/// Only `High` and `Unknown` are produced today. `Medium` and `Low` exist so
/// that consumers of the output format can already match on them; no rule
/// populates them yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
    Unknown,
}

impl Confidence {
    /// Lowercase tag as written to the output document.
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
            Confidence::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification result for one subnet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcAssignment {
    /// Serving DC, or `None` when the subnet is undefined.
    pub primary_dc: Option<String>,
    /// DCs that cleared the latency threshold.
    pub possible_dcs: BTreeSet<String>,
    /// Latency keyed by DC name.
    pub latencies: BTreeMap<String, LatencyMs>,
    /// Certainty of the assignment.
    pub confidence: Confidence,
}

impl DcAssignment {
    /// An assignment to a single DC with high confidence.
    pub fn assigned(dc: impl Into<String>, latencies: BTreeMap<String, LatencyMs>) -> Self {
        let dc = dc.into();
        Self {
            possible_dcs: BTreeSet::from([dc.clone()]),
            primary_dc: Some(dc),
            latencies,
            confidence: Confidence::High,
        }
    }

    /// An undefined assignment with unknown confidence.
    pub fn undefined(
        possible_dcs: BTreeSet<String>,
        latencies: BTreeMap<String, LatencyMs>,
    ) -> Self {
        Self {
            primary_dc: None,
            possible_dcs,
            latencies,
            confidence: Confidence::Unknown,
        }
    }

    /// Is a single primary DC defined?
    #[inline]
    pub fn is_assigned(&self) -> bool {
        self.primary_dc.is_some()
    }

    /// Primary DC name, or "Undefined".
    pub fn primary_label(&self) -> &str {
        self.primary_dc.as_deref().unwrap_or(UNDEFINED_DC)
    }
}

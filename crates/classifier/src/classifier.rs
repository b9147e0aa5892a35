//! Threshold-based DC classification.
//!
//! A subnet belongs to a DC when exactly one DC sees it at or below the
//! low-latency threshold. No DC under the threshold, or several, leaves the
//! subnet undefined with unknown confidence. Reachability and probe method
//! are not consulted.

use dcmap_core::{
    config::ClassifierConfig, DcAssignment, DcLocationMap, LatencyMs, SubnetLatencyProfile,
};
use ordered_float::OrderedFloat;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

pub use dcmap_core::config::DEFAULT_LOW_LATENCY_THRESHOLD_MS;

/// Stateless subnet-to-DC classifier.
#[derive(Debug, Clone)]
pub struct DcClassifier {
    /// Inclusive low-latency threshold (ms).
    threshold_ms: LatencyMs,
    /// Vantage point location to DC name.
    locations: DcLocationMap,
}

impl DcClassifier {
    /// Create a classifier with the default 20 ms threshold.
    pub fn new(locations: DcLocationMap) -> Self {
        Self::with_threshold(locations, DEFAULT_LOW_LATENCY_THRESHOLD_MS)
    }

    /// Create a classifier with an explicit threshold.
    pub fn with_threshold(locations: DcLocationMap, threshold_ms: LatencyMs) -> Self {
        Self {
            threshold_ms,
            locations,
        }
    }

    /// Create a classifier from configuration.
    pub fn from_config(config: &ClassifierConfig, locations: DcLocationMap) -> Self {
        Self::with_threshold(locations, config.low_latency_threshold_ms)
    }

    /// Threshold in use (ms).
    pub fn threshold_ms(&self) -> LatencyMs {
        self.threshold_ms
    }

    /// DC label for a location. Unmapped locations keep their own name.
    fn dc_label<'a>(&'a self, location: &'a str) -> &'a str {
        self.locations.dc_name(location).unwrap_or(location)
    }

    /// Classify one subnet.
    pub fn classify(&self, profile: &SubnetLatencyProfile) -> DcAssignment {
        if profile.is_empty() {
            return DcAssignment::undefined(BTreeSet::new(), BTreeMap::new());
        }

        let latencies: BTreeMap<String, LatencyMs> = profile
            .latencies
            .iter()
            .map(|(location, &latency)| (self.dc_label(location).to_string(), latency))
            .collect();

        let low_latency: BTreeSet<String> = profile
            .latencies
            .iter()
            .filter(|&(_, &latency)| latency <= self.threshold_ms)
            .map(|(location, _)| self.dc_label(location).to_string())
            .collect();

        if low_latency.len() != 1 {
            // Nothing close, or close to several DCs at once.
            return DcAssignment::undefined(low_latency, latencies);
        }

        // The fastest vantage point is necessarily the only one under the threshold.
        let fastest = profile
            .latencies
            .iter()
            .min_by_key(|&(_, &latency)| OrderedFloat(latency))
            .map(|(location, _)| self.dc_label(location));

        match fastest {
            Some(dc) => DcAssignment::assigned(dc, latencies),
            None => DcAssignment::undefined(BTreeSet::new(), latencies),
        }
    }

    /// Classify every profile, keyed by subnet.
    pub fn classify_all(
        &self,
        profiles: &BTreeMap<String, SubnetLatencyProfile>,
    ) -> BTreeMap<String, DcAssignment> {
        profiles
            .iter()
            .map(|(subnet, profile)| {
                let assignment = self.classify(profile);
                debug!(
                    subnet = subnet.as_str(),
                    dc = assignment.primary_label(),
                    confidence = %assignment.confidence,
                    "classified subnet"
                );
                (subnet.clone(), assignment)
            })
            .collect()
    }
}

//! Merging vantage point reports into per-subnet latency profiles.

use dcmap_core::{EndpointReport, SubnetLatencyProfile};
use std::collections::{BTreeMap, HashSet};

/// Build one latency profile per subnet seen in any report.
///
/// Within a report the first measurement of a subnet wins; later duplicates
/// are ignored. Reports are applied in order, so a location that appears in
/// two reports keeps the value from the later one. Profiles are keyed and
/// ordered by subnet string.
pub fn aggregate(reports: &[EndpointReport]) -> BTreeMap<String, SubnetLatencyProfile> {
    let mut profiles: BTreeMap<String, SubnetLatencyProfile> = BTreeMap::new();

    for report in reports {
        let mut seen: HashSet<&str> = HashSet::with_capacity(report.subnets.len());

        for measurement in &report.subnets {
            if !seen.insert(measurement.subnet.as_str()) {
                continue;
            }

            profiles
                .entry(measurement.subnet.clone())
                .or_insert_with(|| SubnetLatencyProfile::new(measurement.subnet.clone()))
                .record(report.location.clone(), measurement.latency_ms);
        }
    }

    profiles
}

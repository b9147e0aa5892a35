//! Grouping and summarizing DC assignments.

use dcmap_core::{Confidence, DcAssignment, LatencyMs, UNDEFINED_DC};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// One subnet as listed under its DC in the output document.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum SubnetRecord {
    /// Subnet with a primary DC.
    Assigned {
        subnet: String,
        latencies: BTreeMap<String, LatencyMs>,
        confidence: Confidence,
    },
    /// Subnet without a primary DC. `possible_dcs` is `None` when no DC
    /// cleared the threshold.
    Undefined {
        subnet: String,
        latencies: BTreeMap<String, LatencyMs>,
        possible_dcs: Option<Vec<String>>,
    },
}

impl SubnetRecord {
    /// Build the record for a classified subnet.
    pub fn new(subnet: &str, assignment: &DcAssignment) -> Self {
        if assignment.is_assigned() {
            SubnetRecord::Assigned {
                subnet: subnet.to_string(),
                latencies: assignment.latencies.clone(),
                confidence: assignment.confidence,
            }
        } else {
            let possible_dcs = (!assignment.possible_dcs.is_empty())
                .then(|| assignment.possible_dcs.iter().cloned().collect());
            SubnetRecord::Undefined {
                subnet: subnet.to_string(),
                latencies: assignment.latencies.clone(),
                possible_dcs,
            }
        }
    }

    pub fn subnet(&self) -> &str {
        match self {
            SubnetRecord::Assigned { subnet, .. } | SubnetRecord::Undefined { subnet, .. } => subnet,
        }
    }
}

/// Subnet records grouped by DC, in a fixed DC order.
///
/// Serializes as a JSON object whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DcGroups {
    groups: Vec<(String, Vec<SubnetRecord>)>,
}

impl DcGroups {
    /// Empty groups for the given DCs, followed by "Undefined".
    pub fn with_dcs<I, S>(dc_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut groups: Vec<(String, Vec<SubnetRecord>)> = dc_names
            .into_iter()
            .map(|name| (name.into(), Vec::new()))
            .collect();
        groups.push((UNDEFINED_DC.to_string(), Vec::new()));
        Self { groups }
    }

    /// Append a record to a DC's group, creating the group if it is new.
    pub fn push(&mut self, dc: &str, record: SubnetRecord) {
        match self.groups.iter_mut().find(|(name, _)| name == dc) {
            Some((_, records)) => records.push(record),
            None => self.groups.push((dc.to_string(), vec![record])),
        }
    }

    /// Records for a DC.
    pub fn get(&self, dc: &str) -> &[SubnetRecord] {
        self.groups
            .iter()
            .find(|(name, _)| name == dc)
            .map(|(_, records)| records.as_slice())
            .unwrap_or(&[])
    }

    /// DC names in output order.
    pub fn dc_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }
}

impl Serialize for DcGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (dc, records) in &self.groups {
            map.serialize_entry(dc, records)?;
        }
        map.end()
    }
}

/// Number of subnets at each confidence level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ConfidenceCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub unknown: usize,
}

impl ConfidenceCounts {
    /// Count one more subnet at a level.
    pub fn add(&mut self, confidence: Confidence) {
        match confidence {
            Confidence::High => self.high += 1,
            Confidence::Medium => self.medium += 1,
            Confidence::Low => self.low += 1,
            Confidence::Unknown => self.unknown += 1,
        }
    }
}

/// Run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct Summary {
    pub total_subnets: usize,
    pub assigned_subnets: usize,
    pub undefined_subnets: usize,
    pub confidence_levels: ConfidenceCounts,
}

/// The complete assignment document.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AssignmentReport {
    pub dc_assignments: DcGroups,
    pub summary: Summary,
}

impl AssignmentReport {
    /// Group classified subnets under their DCs and summarize the run.
    ///
    /// `dc_names` fixes the group order; every listed DC gets a key even when
    /// no subnet was assigned to it.
    pub fn build<I, S>(dc_names: I, assignments: &BTreeMap<String, DcAssignment>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut groups = DcGroups::with_dcs(dc_names);
        let mut summary = Summary {
            total_subnets: assignments.len(),
            ..Summary::default()
        };

        for (subnet, assignment) in assignments {
            groups.push(assignment.primary_label(), SubnetRecord::new(subnet, assignment));
            summary.confidence_levels.add(assignment.confidence);
            if assignment.is_assigned() {
                summary.assigned_subnets += 1;
            } else {
                summary.undefined_subnets += 1;
            }
        }

        Self {
            dc_assignments: groups,
            summary,
        }
    }

    /// Pretty-printed JSON document.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn latencies(entries: &[(&str, f64)]) -> BTreeMap<String, LatencyMs> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn sample() -> BTreeMap<String, DcAssignment> {
        let mut results = BTreeMap::new();
        results.insert(
            "1.2.3.0/24".to_string(),
            DcAssignment::assigned(
                "Singapore",
                latencies(&[("Singapore", 15.0), ("Miami", 180.0), ("Amsterdam", 190.0)]),
            ),
        );
        results.insert(
            "2.2.2.0/24".to_string(),
            DcAssignment::undefined(
                ["Singapore", "Miami"].iter().map(|s| s.to_string()).collect(),
                latencies(&[("Singapore", 12.0), ("Miami", 18.0), ("Amsterdam", 200.0)]),
            ),
        );
        results.insert(
            "4.4.4.0/24".to_string(),
            DcAssignment::undefined(BTreeSet::new(), latencies(&[("Amsterdam", 45.0)])),
        );
        results
    }

    #[test]
    fn test_summary_counts() {
        let report = AssignmentReport::build(["Singapore", "Miami", "Amsterdam"], &sample());

        assert_eq!(report.summary.total_subnets, 3);
        assert_eq!(report.summary.assigned_subnets, 1);
        assert_eq!(report.summary.undefined_subnets, 2);
        assert_eq!(report.summary.confidence_levels.high, 1);
        assert_eq!(report.summary.confidence_levels.unknown, 2);
        assert_eq!(report.summary.confidence_levels.medium, 0);
        assert_eq!(report.summary.confidence_levels.low, 0);
    }

    #[test]
    fn test_groups_keep_dc_order_and_empty_dcs() {
        let report = AssignmentReport::build(["Singapore", "Miami", "Amsterdam"], &sample());
        let groups = &report.dc_assignments;

        let names: Vec<_> = groups.dc_names().collect();
        assert_eq!(names, vec!["Singapore", "Miami", "Amsterdam", "Undefined"]);
        assert_eq!(groups.get("Singapore").len(), 1);
        assert!(groups.get("Miami").is_empty());
        assert_eq!(groups.get("Undefined").len(), 2);
        assert_eq!(groups.get("Undefined")[0].subnet(), "2.2.2.0/24");
    }

    #[test]
    fn test_json_shape() {
        let report = AssignmentReport::build(["Singapore", "Miami", "Amsterdam"], &sample());
        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let singapore = &value["dc_assignments"]["Singapore"][0];
        assert_eq!(singapore["subnet"], "1.2.3.0/24");
        assert_eq!(singapore["confidence"], "high");
        assert_eq!(singapore["latencies"]["Miami"], 180.0);
        assert!(singapore.get("possible_dcs").is_none());

        let ambiguous = &value["dc_assignments"]["Undefined"][0];
        assert_eq!(ambiguous["possible_dcs"], serde_json::json!(["Miami", "Singapore"]));
        assert!(ambiguous.get("confidence").is_none());

        let remote = &value["dc_assignments"]["Undefined"][1];
        assert!(remote["possible_dcs"].is_null());

        assert_eq!(value["dc_assignments"]["Amsterdam"], serde_json::json!([]));
        assert_eq!(value["summary"]["undefined_subnets"], 2);
        assert_eq!(value["summary"]["confidence_levels"]["high"], 1);

        let dc_order = json.find("\"Singapore\": [").unwrap() < json.find("\"Undefined\": [").unwrap();
        assert!(dc_order);
    }

    #[test]
    fn test_unlisted_dc_gets_its_own_group() {
        let mut results = BTreeMap::new();
        results.insert(
            "3.3.3.0/24".to_string(),
            DcAssignment::assigned("Tokyo", latencies(&[("Tokyo", 2.0)])),
        );

        let report = AssignmentReport::build(["Singapore"], &results);

        assert_eq!(report.dc_assignments.get("Tokyo").len(), 1);
        assert_eq!(report.summary.assigned_subnets, 1);
    }
}

//! Writing the assignment document and routing rule files.

use crate::report::{AssignmentReport, SubnetRecord};
use dcmap_core::{config::DatacenterConfig, Config, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Routing rule for one subnet.
#[inline]
pub fn rule_line(subnet: &str) -> String {
    format!("IP-CIDR,{subnet},no-resolve")
}

/// Writes a report into an output directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
    assignments_file: String,
    datacenters: Vec<DatacenterConfig>,
}

impl ReportWriter {
    pub fn new(
        dir: impl Into<PathBuf>,
        assignments_file: impl Into<String>,
        datacenters: Vec<DatacenterConfig>,
    ) -> Self {
        Self {
            dir: dir.into(),
            assignments_file: assignments_file.into(),
            datacenters,
        }
    }

    /// Create a writer from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.output.dir.clone(),
            config.output.assignments_file.clone(),
            config.datacenters.clone(),
        )
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the JSON document and one rule file per configured DC.
    ///
    /// Rule files are rewritten on every run, empty when no subnet was
    /// assigned to their DC. Returns the paths written.
    pub fn write(&self, report: &AssignmentReport) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.dir)?;
        let mut written = Vec::with_capacity(self.datacenters.len() + 1);

        let assignments_path = self.dir.join(&self.assignments_file);
        fs::write(&assignments_path, report.to_json()?)?;
        info!(path = %assignments_path.display(), "wrote assignment document");
        written.push(assignments_path);

        for dc in &self.datacenters {
            let records = report.dc_assignments.get(&dc.name);
            let path = self.dir.join(&dc.rule_file);
            fs::write(&path, rules_for(records))?;
            info!(
                path = %path.display(),
                dc = dc.name.as_str(),
                rules = records.len(),
                "wrote routing rules"
            );
            written.push(path);
        }

        Ok(written)
    }
}

/// Rule file contents for a DC's records, one line per assigned subnet.
fn rules_for(records: &[SubnetRecord]) -> String {
    records
        .iter()
        .filter(|record| matches!(record, SubnetRecord::Assigned { .. }))
        .map(|record| rule_line(record.subnet()) + "\n")
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmap_core::DcAssignment;
    use std::collections::{BTreeMap, BTreeSet};

    fn report() -> AssignmentReport {
        let mut results = BTreeMap::new();
        for subnet in ["1.2.3.0/24", "1.2.4.0/24"] {
            results.insert(
                subnet.to_string(),
                DcAssignment::assigned("Singapore", BTreeMap::from([("Singapore".to_string(), 9.0)])),
            );
        }
        results.insert(
            "4.4.4.0/24".to_string(),
            DcAssignment::undefined(BTreeSet::new(), BTreeMap::from([("Amsterdam".to_string(), 45.0)])),
        );
        AssignmentReport::build(Config::default().dc_names(), &results)
    }

    #[test]
    fn test_rule_line() {
        assert_eq!(rule_line("1.2.3.0/24"), "IP-CIDR,1.2.3.0/24,no-resolve");
    }

    #[test]
    fn test_write_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let writer = ReportWriter::new(
            dir.path(),
            config.output.assignments_file.clone(),
            config.datacenters.clone(),
        );

        let written = writer.write(&report()).unwrap();
        assert_eq!(written.len(), 4);

        let sg = fs::read_to_string(dir.path().join("telegramSG.conf")).unwrap();
        assert_eq!(
            sg,
            "IP-CIDR,1.2.3.0/24,no-resolve\nIP-CIDR,1.2.4.0/24,no-resolve\n"
        );

        let eu = fs::read_to_string(dir.path().join("telegramEU.conf")).unwrap();
        assert!(eu.is_empty());
        assert!(dir.path().join("telegramUS.conf").exists());

        let doc = fs::read_to_string(dir.path().join("dc_assignments.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&doc).unwrap();
        assert_eq!(value["summary"]["total_subnets"], 3);
        assert_eq!(value["summary"]["assigned_subnets"], 2);
    }

    #[test]
    fn test_write_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out").join("latest");
        let writer = ReportWriter::new(&nested, "dc_assignments.json", Config::default().datacenters);

        writer.write(&report()).unwrap();

        assert!(nested.join("dc_assignments.json").exists());
        assert_eq!(writer.dir(), nested.as_path());
    }
}

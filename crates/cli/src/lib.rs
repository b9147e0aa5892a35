//! End-to-end dcmap run: fetch, aggregate, classify, write.

use dcmap_classifier::DcClassifier;
use dcmap_core::{Config, Result};
use dcmap_ingestion::{aggregate, collect_reports, MeasurementSource};
use dcmap_report::{AssignmentReport, ReportWriter};
use std::path::PathBuf;
use tracing::info;

/// What a completed run produced.
#[derive(Debug)]
pub struct RunOutput {
    /// Grouped assignments and summary.
    pub report: AssignmentReport,
    /// Files written, assignment document first.
    pub written: Vec<PathBuf>,
    /// Vantage points attempted.
    pub attempted: usize,
    /// Vantage points that contributed data.
    pub succeeded: usize,
}

/// Run the full pipeline against a measurement source.
///
/// Fails without writing anything when no vantage point delivers a report.
pub fn run<S>(config: &Config, source: &S) -> Result<RunOutput>
where
    S: MeasurementSource + ?Sized,
{
    let locations = config.location_map();

    let outcome = collect_reports(source, &config.source.endpoints, &locations);
    let attempted = outcome.attempted();
    let succeeded = outcome.succeeded();
    let reports = outcome.into_reports()?;
    info!(succeeded, attempted, "collected vantage point reports");

    let profiles = aggregate(&reports);
    let classifier = DcClassifier::from_config(&config.classifier, locations);
    let assignments = classifier.classify_all(&profiles);

    let report = AssignmentReport::build(config.dc_names(), &assignments);
    let written = ReportWriter::from_config(config).write(&report)?;

    Ok(RunOutput {
        report,
        written,
        attempted,
        succeeded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use dcmap_core::{EndpointReport, Error, SubnetMeasurement};
    use std::collections::HashMap;
    use std::fs;

    /// Serves prepared reports keyed by endpoint URL.
    struct StaticSource {
        reports: HashMap<String, EndpointReport>,
    }

    impl MeasurementSource for StaticSource {
        fn fetch(&self, url: &str) -> Result<EndpointReport> {
            self.reports
                .get(url)
                .cloned()
                .ok_or_else(|| Error::fetch(format!("{url}: timed out")))
        }
    }

    fn endpoint_report(location: &str, subnets: &[(&str, f64)]) -> EndpointReport {
        EndpointReport {
            location: location.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap(),
            subnets: subnets
                .iter()
                .map(|(subnet, latency_ms)| SubnetMeasurement {
                    subnet: subnet.to_string(),
                    latency_ms: *latency_ms,
                    method: "icmp".to_string(),
                    reachable: true,
                    test_ip: "0.0.0.1".to_string(),
                })
                .collect(),
        }
    }

    fn config_in(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.output.dir = dir.to_path_buf();
        config
    }

    fn source(config: &Config, reports: Vec<EndpointReport>) -> StaticSource {
        // Endpoints are listed EU, SG, US.
        let by_location: HashMap<&str, usize> = [("EU", 0), ("SG", 1), ("US", 2)].into_iter().collect();
        StaticSource {
            reports: reports
                .into_iter()
                .map(|r| (config.source.endpoints[by_location[r.location.as_str()]].clone(), r))
                .collect(),
        }
    }

    #[test]
    fn test_end_to_end_assignments() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let source = source(
            &config,
            vec![
                endpoint_report("SG", &[("1.2.3.0/24", 15.0), ("2.2.2.0/24", 12.0)]),
                endpoint_report("US", &[("1.2.3.0/24", 180.0), ("2.2.2.0/24", 18.0)]),
                endpoint_report("EU", &[("1.2.3.0/24", 190.0), ("2.2.2.0/24", 200.0), ("4.4.4.0/24", 45.0)]),
            ],
        );

        let output = run(&config, &source).unwrap();

        assert_eq!(output.attempted, 3);
        assert_eq!(output.succeeded, 3);
        assert_eq!(output.written.len(), 4);

        let summary = output.report.summary;
        assert_eq!(summary.total_subnets, 3);
        assert_eq!(summary.assigned_subnets, 1);
        assert_eq!(summary.undefined_subnets, 2);

        let doc = fs::read_to_string(dir.path().join("dc_assignments.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&doc).unwrap();
        let groups = &value["dc_assignments"];

        assert_eq!(groups["Singapore"][0]["subnet"], "1.2.3.0/24");
        assert_eq!(groups["Singapore"][0]["confidence"], "high");

        assert_eq!(groups["Undefined"][0]["subnet"], "2.2.2.0/24");
        assert_eq!(groups["Undefined"][0]["possible_dcs"], serde_json::json!(["Miami", "Singapore"]));
        assert_eq!(groups["Undefined"][1]["subnet"], "4.4.4.0/24");
        assert!(groups["Undefined"][1]["possible_dcs"].is_null());

        let sg_rules = fs::read_to_string(dir.path().join("telegramSG.conf")).unwrap();
        assert_eq!(sg_rules, "IP-CIDR,1.2.3.0/24,no-resolve\n");
        let us_rules = fs::read_to_string(dir.path().join("telegramUS.conf")).unwrap();
        assert!(us_rules.is_empty());
    }

    #[test]
    fn test_runs_with_partial_sources() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let source = source(&config, vec![endpoint_report("EU", &[("4.4.4.0/24", 7.5)])]);

        let output = run(&config, &source).unwrap();

        assert_eq!(output.succeeded, 1);
        assert_eq!(output.report.dc_assignments.get("Amsterdam").len(), 1);
        let eu_rules = fs::read_to_string(dir.path().join("telegramEU.conf")).unwrap();
        assert_eq!(eu_rules, "IP-CIDR,4.4.4.0/24,no-resolve\n");
    }

    #[test]
    fn test_no_sources_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let source = source(&config, Vec::new());

        let result = run(&config, &source);

        assert!(matches!(result, Err(Error::NoData(_))));
        assert!(!dir.path().join("dc_assignments.json").exists());
        assert!(!dir.path().join("telegramSG.conf").exists());
    }
}

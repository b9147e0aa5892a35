//! Vantage point report fetching and parsing.
//!
//! Each vantage point exposes one JSON document listing its latest latency
//! measurements. Sources are fetched one after another; a source that fails
//! in any way is dropped from the run instead of aborting it.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use dcmap_core::{Credentials, DcLocationMap, EndpointReport, Error, Result, SubnetMeasurement};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Header carrying the access client id.
pub const CLIENT_ID_HEADER: &str = "CF-Access-Client-Id";
/// Header carrying the access client secret.
pub const CLIENT_SECRET_HEADER: &str = "CF-Access-Client-Secret";

/// Anything that can produce a vantage point report for an endpoint.
pub trait MeasurementSource {
    /// Fetch and parse the report behind `url`.
    fn fetch(&self, url: &str) -> Result<EndpointReport>;
}

/// Blocking HTTP source authenticated with access credentials.
pub struct HttpSource {
    agent: ureq::Agent,
    credentials: Credentials,
}

impl HttpSource {
    /// Create a source using the HTTP client's default settings.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            credentials,
        }
    }
}

impl MeasurementSource for HttpSource {
    fn fetch(&self, url: &str) -> Result<EndpointReport> {
        debug!(url, "requesting vantage point report");

        let response = self
            .agent
            .get(url)
            .set(CLIENT_ID_HEADER, &self.credentials.client_id)
            .set(CLIENT_SECRET_HEADER, &self.credentials.client_secret)
            .call()
            .map_err(|err| match err {
                ureq::Error::Status(code, _) => Error::status(format!("HTTP {code} from {url}")),
                ureq::Error::Transport(transport) => Error::fetch(format!("{url}: {transport}")),
            })?;

        let code = response.status();
        if !(200..300).contains(&code) {
            return Err(Error::status(format!("HTTP {code} from {url}")));
        }

        let body = response.into_string()?;
        parse_report(&body)
    }
}

/// Report body as served by a vantage point.
#[derive(Debug, Deserialize)]
struct WireReport {
    status: String,
    location: Option<String>,
    timestamp: Option<String>,
    data: Option<WireData>,
}

#[derive(Debug, Deserialize)]
struct WireData {
    subnets: Vec<SubnetMeasurement>,
}

/// Parse a vantage point report body.
///
/// The body must carry `"status": "ok"`, a location, a timestamp and the
/// subnet list; anything else is rejected as a whole. A negative latency
/// also rejects the report.
pub fn parse_report(body: &str) -> Result<EndpointReport> {
    let wire: WireReport = serde_json::from_str(body)?;

    if wire.status != "ok" {
        return Err(Error::status(format!("source reported status `{}`", wire.status)));
    }

    let location = wire
        .location
        .ok_or_else(|| Error::parse("report has no location"))?;
    let raw_timestamp = wire
        .timestamp
        .ok_or_else(|| Error::parse("report has no timestamp"))?;
    let data = wire
        .data
        .ok_or_else(|| Error::parse("report has no data section"))?;

    if let Some(bad) = data.subnets.iter().find(|m| m.latency_ms < 0.0) {
        return Err(Error::parse(format!(
            "negative latency {} for subnet {}",
            bad.latency_ms, bad.subnet
        )));
    }

    Ok(EndpointReport {
        location,
        timestamp: parse_timestamp(&raw_timestamp)?,
        subnets: data.subnets,
    })
}

/// Naive date-time layouts, most precise first.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 timestamp. Values without an offset are taken as UTC,
/// a bare date as midnight.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%:z") {
        return Ok(ts.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| Error::parse(format!("invalid timestamp `{raw}`")))
}

/// A vantage point that did not contribute to the run.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub url: String,
    pub reason: String,
}

/// Result of fetching every configured endpoint once.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Reports that were fetched and accepted, in endpoint order.
    pub reports: Vec<EndpointReport>,
    /// Endpoints that were dropped.
    pub failures: Vec<FetchFailure>,
}

impl FetchOutcome {
    /// Number of endpoints attempted.
    pub fn attempted(&self) -> usize {
        self.reports.len() + self.failures.len()
    }

    /// Number of endpoints that contributed a report.
    pub fn succeeded(&self) -> usize {
        self.reports.len()
    }

    /// Accepted reports, or an error when none were accepted.
    pub fn into_reports(self) -> Result<Vec<EndpointReport>> {
        if self.reports.is_empty() {
            return Err(Error::no_data(format!(
                "all {} vantage points failed",
                self.failures.len()
            )));
        }
        Ok(self.reports)
    }
}

/// Fetch every endpoint in order, dropping the ones that fail.
///
/// A report whose location is not a known vantage point is dropped as well.
pub fn collect_reports<S>(source: &S, endpoints: &[String], locations: &DcLocationMap) -> FetchOutcome
where
    S: MeasurementSource + ?Sized,
{
    let mut outcome = FetchOutcome::default();

    for url in endpoints {
        let accepted = source.fetch(url).and_then(|report| {
            if locations.contains(&report.location) {
                Ok(report)
            } else {
                Err(Error::parse(format!("unknown vantage point location `{}`", report.location)))
            }
        });

        match accepted {
            Ok(report) => {
                info!(
                    url = url.as_str(),
                    location = report.location.as_str(),
                    subnets = report.subnets.len(),
                    timestamp = %report.timestamp,
                    "fetched vantage point report"
                );
                outcome.reports.push(report);
            }
            Err(err) => {
                warn!(url = url.as_str(), error = %err, "dropping vantage point");
                outcome.failures.push(FetchFailure {
                    url: url.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    outcome
}

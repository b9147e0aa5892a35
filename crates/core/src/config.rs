//! Configuration structures for the dcmap system.

use crate::error::{Error, Result};
use crate::types::LatencyMs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Main configuration for a dcmap run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Measurement source configuration.
    pub source: SourceConfig,
    /// Classifier configuration.
    pub classifier: ClassifierConfig,
    /// Known datacenters and the vantage point next to each.
    pub datacenters: Vec<DatacenterConfig>,
    /// Output configuration.
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            classifier: ClassifierConfig::default(),
            datacenters: vec![
                DatacenterConfig::new("SG", "Singapore", "telegramSG.conf"),
                DatacenterConfig::new("US", "Miami", "telegramUS.conf"),
                DatacenterConfig::new("EU", "Amsterdam", "telegramEU.conf"),
            ],
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Location-to-DC-name map for the configured datacenters.
    pub fn location_map(&self) -> DcLocationMap {
        DcLocationMap::from_datacenters(&self.datacenters)
    }

    /// DC names in configured order.
    pub fn dc_names(&self) -> Vec<String> {
        self.datacenters.iter().map(|dc| dc.name.clone()).collect()
    }
}

/// Measurement source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Vantage point endpoints, fetched in this order.
    pub endpoints: Vec<String>,
    /// Environment variable holding the access client id.
    pub client_id_env: String,
    /// Environment variable holding the access client secret.
    pub client_secret_env: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![
                "https://tg-finder-eu.otherdc.com/latency".to_string(),
                "https://tg-finder-sg.otherdc.com/latency".to_string(),
                "https://tg-finder-us.otherdc.com/latency".to_string(),
            ],
            client_id_env: "cfid".to_string(),
            client_secret_env: "cfsecret".to_string(),
        }
    }
}

/// Latency (ms) at or below which a DC counts as close to a subnet.
pub const DEFAULT_LOW_LATENCY_THRESHOLD_MS: LatencyMs = 20.0;

/// Classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Latencies at or below this value (ms) count as low latency.
    pub low_latency_threshold_ms: LatencyMs,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            low_latency_threshold_ms: DEFAULT_LOW_LATENCY_THRESHOLD_MS,
        }
    }
}

/// One datacenter and the vantage point located next to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatacenterConfig {
    /// Vantage point location tag (e.g. "SG").
    pub location: String,
    /// Human-readable DC name (e.g. "Singapore").
    pub name: String,
    /// Routing rule file written for this DC.
    pub rule_file: String,
}

impl DatacenterConfig {
    pub fn new(
        location: impl Into<String>,
        name: impl Into<String>,
        rule_file: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            name: name.into(),
            rule_file: rule_file.into(),
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving all output files.
    pub dir: PathBuf,
    /// File name of the JSON assignment document.
    pub assignments_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            assignments_file: "dc_assignments.json".to_string(),
        }
    }
}

/// Immutable mapping from vantage point location to DC name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DcLocationMap {
    locations: BTreeMap<String, String>,
}

impl DcLocationMap {
    /// Build the map from datacenter entries.
    pub fn from_datacenters(datacenters: &[DatacenterConfig]) -> Self {
        datacenters
            .iter()
            .map(|dc| (dc.location.clone(), dc.name.clone()))
            .collect()
    }

    /// DC name for a location.
    #[inline]
    pub fn dc_name(&self, location: &str) -> Option<&str> {
        self.locations.get(location).map(String::as_str)
    }

    #[inline]
    pub fn contains(&self, location: &str) -> bool {
        self.locations.contains_key(location)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DcLocationMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            locations: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Access credentials sent with every source request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Resolve credentials from the process environment.
    pub fn from_env(source: &SourceConfig) -> Result<Self> {
        Self::resolve(source, |name| std::env::var(name).ok())
    }

    /// Resolve credentials through an arbitrary variable lookup.
    ///
    /// Missing and empty values are both rejected.
    pub fn resolve<F>(source: &SourceConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fetch = |name: &str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    Error::config(format!("access credential `{name}` not set in environment"))
                })
        };

        Ok(Self {
            client_id: fetch(&source.client_id_env)?,
            client_secret: fetch(&source.client_secret_env)?,
        })
    }
}

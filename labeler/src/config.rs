//! Configuration module for the node labeler
//!
//! Handles loading and validating configuration from YAML files.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use labeler_core::labels::GPU_NODE_SELECTOR;
use labeler_core::predictor::DEFAULT_PREDICTION_WINDOW;
use labeler_core::topology::DEFAULT_TOPOLOGY_INTERVAL;
use labeler_gcp::compute::DEFAULT_COMPUTE_URL;
use labeler_gcp::http::DEFAULT_REQUEST_TIMEOUT;
use labeler_gcp::metadata::DEFAULT_METADATA_URL;
use labeler_gcp::monitoring::DEFAULT_MONITORING_URL;

/// Topology labeler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Pause between update cycles
    #[serde(with = "humantime_serde", default = "default_topology_interval")]
    pub interval: Duration,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            interval: default_topology_interval(),
        }
    }
}

/// Prediction labeler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Google Cloud project; discovered from the metadata server if unset
    #[serde(default)]
    pub project_id: Option<String>,

    /// Selector of the nodes to label
    #[serde(default = "default_label_selector")]
    pub label_selector: String,

    /// Trailing window of the monitoring query
    #[serde(with = "humantime_serde", default = "default_prediction_window")]
    pub window: Duration,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            label_selector: default_label_selector(),
            window: default_prediction_window(),
        }
    }
}

/// Google Cloud endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcpConfig {
    /// Instance metadata server
    #[serde(default = "default_metadata_url")]
    pub metadata_url: String,

    /// Compute Engine API
    #[serde(default = "default_compute_url")]
    pub compute_url: String,

    /// Cloud Monitoring API
    #[serde(default = "default_monitoring_url")]
    pub monitoring_url: String,

    /// Timeout of every HTTP request
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub request_timeout: Duration,
}

impl Default for GcpConfig {
    fn default() -> Self {
        Self {
            metadata_url: default_metadata_url(),
            compute_url: default_compute_url(),
            monitoring_url: default_monitoring_url(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Metrics export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether the topology daemon serves metrics
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Port to expose metrics on
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_metrics_port(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Topology labeler configuration
    #[serde(default)]
    pub topology: TopologyConfig,

    /// Prediction labeler configuration
    #[serde(default)]
    pub predictor: PredictorConfig,

    /// Google Cloud endpoints
    #[serde(default)]
    pub gcp: GcpConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Dry run mode - log label patches but don't send them
    #[serde(default)]
    pub dry_run: bool,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.topology.interval.is_zero() {
            anyhow::bail!("topology.interval must be > 0");
        }
        if self.predictor.window.is_zero() {
            anyhow::bail!("predictor.window must be > 0");
        }
        if self.predictor.label_selector.trim().is_empty() {
            anyhow::bail!("predictor.label_selector must not be empty");
        }
        if self.gcp.request_timeout.is_zero() {
            anyhow::bail!("gcp.request_timeout must be > 0");
        }
        if self.metrics.enabled && self.metrics.port == 0 {
            anyhow::bail!("metrics.port must be > 0 when metrics are enabled");
        }
        Ok(())
    }
}

// Default value functions
fn default_topology_interval() -> Duration {
    DEFAULT_TOPOLOGY_INTERVAL
}

fn default_label_selector() -> String {
    GPU_NODE_SELECTOR.to_string()
}

fn default_prediction_window() -> Duration {
    DEFAULT_PREDICTION_WINDOW
}

fn default_metadata_url() -> String {
    DEFAULT_METADATA_URL.to_string()
}

fn default_compute_url() -> String {
    DEFAULT_COMPUTE_URL.to_string()
}

fn default_monitoring_url() -> String {
    DEFAULT_MONITORING_URL.to_string()
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

fn default_metrics_port() -> u16 {
    9488
}

fn default_true() -> bool {
    true
}

//! External fact sources
//!
//! Traits for the cloud services the labelers read from. Implementations
//! live in `labeler-gcp`; tests use the fakes in [`crate::mock`].

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CloudError;

/// Local instance metadata service
#[async_trait]
pub trait InstanceMetadata: Send + Sync {
    /// Name of the local instance, which is also its Kubernetes node name
    async fn instance_name(&self) -> Result<String, CloudError>;

    /// Raw `/cluster/rack/host` placement attribute of the local instance
    async fn physical_host(&self) -> Result<String, CloudError>;
}

/// Compute instance detail lookup
#[async_trait]
pub trait InstanceLookup: Send + Sync {
    /// Numeric instance ID of `instance` in `project`/`zone`
    ///
    /// Returns `Ok(None)` when the instance exists but carries no ID.
    async fn instance_id(
        &self,
        project: &str,
        zone: &str,
        instance: &str,
    ) -> Result<Option<String>, CloudError>;
}

/// Monitoring time series query
#[async_trait]
pub trait TimeSeriesSource: Send + Sync {
    /// Failure prediction series recorded for `instance_id` within `window`,
    /// in the order the backend returned them
    async fn prediction_series(
        &self,
        project: &str,
        instance_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<TimeSeries>, CloudError>;
}

/// Metric labels of one monitoring time series
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeSeries {
    /// Metric type the series belongs to
    pub metric_type: String,
    /// Metric labels
    pub labels: BTreeMap<String, String>,
}

impl TimeSeries {
    /// Build a series carrying the given metric labels
    pub fn with_labels<I, K, V>(metric_type: &str, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            metric_type: metric_type.to_string(),
            labels: labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of a metric label
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

/// Closed time interval of a monitoring query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window of length `length` ending at `end`
    pub fn ending_at(end: DateTime<Utc>, length: Duration) -> Self {
        let length = chrono::Duration::from_std(length).unwrap_or(chrono::Duration::zero());
        Self {
            start: end - length,
            end,
        }
    }

    /// Window of length `length` ending now
    pub fn trailing(length: Duration) -> Self {
        Self::ending_at(Utc::now(), length)
    }
}

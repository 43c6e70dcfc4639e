//! In-memory implementations of the labeler dependencies for testing

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::CloudError;
use crate::labels::LabelSet;
use crate::node::{NodeApi, NodeRecord};
use crate::source::{InstanceLookup, InstanceMetadata, TimeSeries, TimeSeriesSource, TimeWindow};

fn not_found(endpoint: &str) -> CloudError {
    CloudError::Status {
        endpoint: endpoint.to_string(),
        status: 404,
    }
}

fn unavailable(endpoint: &str) -> CloudError {
    CloudError::Status {
        endpoint: endpoint.to_string(),
        status: 503,
    }
}

/// Mock metadata server; an unset value answers with HTTP 404
#[derive(Default)]
pub struct MockMetadata {
    instance_name: Option<String>,
    physical_host: Option<String>,
    /// Number of metadata requests served
    pub requests: AtomicU32,
}

impl MockMetadata {
    /// Metadata server exposing both attributes
    pub fn new(instance_name: &str, physical_host: &str) -> Self {
        Self {
            instance_name: Some(instance_name.to_string()),
            physical_host: Some(physical_host.to_string()),
            requests: AtomicU32::new(0),
        }
    }

    /// Metadata server that knows the instance name only
    pub fn without_physical_host(instance_name: &str) -> Self {
        Self {
            instance_name: Some(instance_name.to_string()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl InstanceMetadata for MockMetadata {
    async fn instance_name(&self) -> Result<String, CloudError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.instance_name
            .clone()
            .ok_or_else(|| not_found("instance/name"))
    }

    async fn physical_host(&self) -> Result<String, CloudError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.physical_host
            .clone()
            .ok_or_else(|| not_found("instance/attributes/physical_host"))
    }
}

/// Mock node API that records label patches
#[derive(Default)]
pub struct MockNodeApi {
    nodes: Vec<NodeRecord>,
    /// Fail node listing
    pub fail_list: AtomicBool,
    failing_patches: HashSet<String>,
    patches: RwLock<Vec<(String, LabelSet)>>,
    selectors: RwLock<Vec<String>>,
}

impl MockNodeApi {
    /// Node API serving `nodes`
    pub fn new(nodes: Vec<NodeRecord>) -> Self {
        Self {
            nodes,
            ..Default::default()
        }
    }

    /// Reject patches to `node_name`
    pub fn with_failing_patch(mut self, node_name: &str) -> Self {
        self.failing_patches.insert(node_name.to_string());
        self
    }

    /// Set whether listing fails
    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    /// Patches applied so far, in order
    pub async fn patches(&self) -> Vec<(String, LabelSet)> {
        self.patches.read().await.clone()
    }

    /// Label selectors nodes were listed with
    pub async fn selectors(&self) -> Vec<String> {
        self.selectors.read().await.clone()
    }
}

#[async_trait]
impl NodeApi for MockNodeApi {
    async fn list_nodes(&self, label_selector: &str) -> Result<Vec<NodeRecord>> {
        self.selectors.write().await.push(label_selector.to_string());
        if self.fail_list.load(Ordering::SeqCst) {
            bail!("Failed to list nodes: connection refused");
        }
        Ok(self.nodes.clone())
    }

    async fn patch_labels(&self, node_name: &str, labels: &LabelSet) -> Result<()> {
        if self.failing_patches.contains(node_name) {
            bail!("Failed to patch node: {}", node_name);
        }
        self.patches
            .write()
            .await
            .push((node_name.to_string(), labels.clone()));
        Ok(())
    }
}

/// Mock Compute API keyed by instance name
#[derive(Default)]
pub struct MockInstanceLookup {
    ids: HashMap<String, Option<String>>,
    failing: HashSet<String>,
}

impl MockInstanceLookup {
    /// Compute API with no instances
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an instance with a numeric ID
    pub fn with_instance(mut self, name: &str, id: &str) -> Self {
        self.ids.insert(name.to_string(), Some(id.to_string()));
        self
    }

    /// Register an instance whose details carry no ID
    pub fn with_instance_without_id(mut self, name: &str) -> Self {
        self.ids.insert(name.to_string(), None);
        self
    }

    /// Make lookups of `name` fail with HTTP 503
    pub fn with_failure(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }
}

#[async_trait]
impl InstanceLookup for MockInstanceLookup {
    async fn instance_id(
        &self,
        _project: &str,
        _zone: &str,
        instance: &str,
    ) -> Result<Option<String>, CloudError> {
        if self.failing.contains(instance) {
            return Err(unavailable("compute/instances"));
        }
        self.ids
            .get(instance)
            .cloned()
            .ok_or_else(|| not_found("compute/instances"))
    }
}

/// Mock Monitoring API keyed by instance ID
#[derive(Default)]
pub struct MockTimeSeries {
    series: HashMap<String, Vec<TimeSeries>>,
    failing: HashSet<String>,
    queries: RwLock<Vec<(String, String, TimeWindow)>>,
}

impl MockTimeSeries {
    /// Monitoring API with no data
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `series` for `instance_id`
    pub fn with_series(mut self, instance_id: &str, series: Vec<TimeSeries>) -> Self {
        self.series.insert(instance_id.to_string(), series);
        self
    }

    /// Make queries for `instance_id` fail with HTTP 503
    pub fn with_failure(mut self, instance_id: &str) -> Self {
        self.failing.insert(instance_id.to_string());
        self
    }

    /// Queries received as (project, instance ID, window)
    pub async fn queries(&self) -> Vec<(String, String, TimeWindow)> {
        self.queries.read().await.clone()
    }
}

#[async_trait]
impl TimeSeriesSource for MockTimeSeries {
    async fn prediction_series(
        &self,
        project: &str,
        instance_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<TimeSeries>, CloudError> {
        self.queries
            .write()
            .await
            .push((project.to_string(), instance_id.to_string(), *window));
        if self.failing.contains(instance_id) {
            return Err(unavailable("monitoring/timeSeries"));
        }
        Ok(self.series.get(instance_id).cloned().unwrap_or_default())
    }
}

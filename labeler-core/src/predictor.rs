//! Prediction Labeler
//!
//! Labels GPU nodes with whether they are recommended to run large training
//! workloads, based on the GPU failure prediction metric of their instance.
//!
//! Per node:
//! 1. Resolve the instance name from the GCE provider ID and the zone label
//! 2. Look up the numeric instance ID
//! 3. Query the prediction series over a trailing window
//! 4. Map the first prediction value found to "True"/"False" and patch

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::labels::{LabelSet, GPU_NODE_SELECTOR, RECOMMENDATION_LABEL};
use crate::node::{gce_instance_name, NodeApi, NodeRecord, ProviderIdError};
use crate::prediction::first_prediction;
use crate::source::{InstanceLookup, TimeSeriesSource, TimeWindow};

/// Default trailing window of the monitoring query
pub const DEFAULT_PREDICTION_WINDOW: Duration = Duration::from_secs(900);

/// Prediction labeler settings
#[derive(Debug, Clone)]
pub struct PredictorConfig {
    /// Project the instances and metrics live in
    pub project_id: String,
    /// Selector of the nodes to label
    pub label_selector: String,
    /// Trailing window of the monitoring query
    pub window: Duration,
}

impl PredictorConfig {
    /// Settings with the default selector and window
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            label_selector: GPU_NODE_SELECTOR.to_string(),
            window: DEFAULT_PREDICTION_WINDOW,
        }
    }
}

/// Why a node was passed over before the monitoring query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Provider ID missing, non-GCE or malformed
    ProviderId(ProviderIdError),
    /// Zone label missing
    MissingZone,
    /// Instance detail lookup failed
    InstanceLookupFailed(String),
    /// Instance details carry no ID
    MissingInstanceId,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ProviderId(e) => write!(f, "{}", e),
            SkipReason::MissingZone => write!(f, "missing zone label"),
            SkipReason::InstanceLookupFailed(e) => write!(f, "instance lookup failed: {}", e),
            SkipReason::MissingInstanceId => write!(f, "instance has no ID"),
        }
    }
}

/// Result of processing one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOutcome {
    /// The recommendation label was written
    Labeled { value: &'static str },
    /// The node was passed over
    Skipped(SkipReason),
    /// No prediction could be retrieved
    NoStatus,
    /// The prediction value is not one we know how to map
    Unrecognized { value: String },
    /// The label patch failed
    PatchFailed,
}

/// Tally of one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub nodes: usize,
    pub labeled: usize,
    pub skipped: usize,
    pub no_status: usize,
    pub unrecognized: usize,
    pub patch_failed: usize,
}

impl PassSummary {
    fn record(&mut self, outcome: &NodeOutcome) {
        self.nodes += 1;
        match outcome {
            NodeOutcome::Labeled { .. } => self.labeled += 1,
            NodeOutcome::Skipped(_) => self.skipped += 1,
            NodeOutcome::NoStatus => self.no_status += 1,
            NodeOutcome::Unrecognized { .. } => self.unrecognized += 1,
            NodeOutcome::PatchFailed => self.patch_failed += 1,
        }
    }
}

/// Batch labeler for GPU failure predictions
pub struct PredictionLabeler {
    nodes: Arc<dyn NodeApi>,
    instances: Arc<dyn InstanceLookup>,
    series: Arc<dyn TimeSeriesSource>,
    config: PredictorConfig,
}

impl PredictionLabeler {
    /// Create a new prediction labeler
    pub fn new(
        nodes: Arc<dyn NodeApi>,
        instances: Arc<dyn InstanceLookup>,
        series: Arc<dyn TimeSeriesSource>,
        config: PredictorConfig,
    ) -> Self {
        Self {
            nodes,
            instances,
            series,
            config,
        }
    }

    /// Label every node matching the selector once
    ///
    /// A listing failure aborts the pass before any node is patched. Failures
    /// on individual nodes are logged and do not affect the rest.
    pub async fn run_pass(&self) -> Result<PassSummary> {
        info!(selector = %self.config.label_selector, "Listing nodes with GPUs");

        let nodes = self
            .nodes
            .list_nodes(&self.config.label_selector)
            .await
            .context("Failed to list nodes")?;

        info!(count = nodes.len(), "Found GPU nodes to process");

        let mut summary = PassSummary::default();
        for node in &nodes {
            let outcome = self.label_node(node).await;
            summary.record(&outcome);
        }

        info!(
            nodes = summary.nodes,
            labeled = summary.labeled,
            skipped = summary.skipped,
            no_status = summary.no_status,
            unrecognized = summary.unrecognized,
            patch_failed = summary.patch_failed,
            "Prediction pass complete"
        );
        Ok(summary)
    }

    /// Run one pass, logging an aborted pass instead of returning it
    ///
    /// Returns `None` when the pass was aborted.
    pub async fn run(&self) -> Option<PassSummary> {
        match self.run_pass().await {
            Ok(summary) => Some(summary),
            Err(e) => {
                error!(error = %format!("{:#}", e), "Prediction pass aborted");
                None
            }
        }
    }

    /// Resolve, query, map and patch a single node
    pub async fn label_node(&self, node: &NodeRecord) -> NodeOutcome {
        let instance_name = match gce_instance_name(node.provider_id.as_deref()) {
            Ok(name) => name,
            Err(e) => {
                info!(node = %node.name, reason = %e, "Skipping node");
                return NodeOutcome::Skipped(SkipReason::ProviderId(e));
            }
        };

        let Some(zone) = node.zone() else {
            warn!(node = %node.name, "Node is missing zone label, skipping");
            return NodeOutcome::Skipped(SkipReason::MissingZone);
        };

        info!(
            node = %node.name,
            instance = instance_name,
            zone = zone,
            "Processing node"
        );

        let instance_id = match self
            .instances
            .instance_id(&self.config.project_id, zone, instance_name)
            .await
        {
            Ok(Some(id)) => id,
            Ok(None) => {
                warn!(node = %node.name, instance = instance_name, "Instance has no ID, skipping");
                return NodeOutcome::Skipped(SkipReason::MissingInstanceId);
            }
            Err(e) => {
                warn!(
                    node = %node.name,
                    instance = instance_name,
                    zone = zone,
                    status = ?e.status(),
                    error = %e,
                    "Failed to get instance ID, skipping"
                );
                return NodeOutcome::Skipped(SkipReason::InstanceLookupFailed(e.to_string()));
            }
        };

        let window = TimeWindow::trailing(self.config.window);
        let series = match self
            .series
            .prediction_series(&self.config.project_id, &instance_id, &window)
            .await
        {
            Ok(series) => series,
            Err(e) => {
                warn!(
                    node = %node.name,
                    instance_id = %instance_id,
                    status = ?e.status(),
                    error = %e,
                    "Failed to query failure prediction, labels not updated"
                );
                return NodeOutcome::NoStatus;
            }
        };

        let Some(signal) = first_prediction(&series) else {
            info!(
                node = %node.name,
                instance_id = %instance_id,
                series = series.len(),
                "No failure prediction in window, labels not updated"
            );
            return NodeOutcome::NoStatus;
        };

        let Some(value) = signal.label_value() else {
            warn!(
                node = %node.name,
                instance_id = %instance_id,
                prediction = %signal,
                "Unknown prediction value, labels not updated"
            );
            return NodeOutcome::Unrecognized {
                value: signal.to_string(),
            };
        };

        let labels = LabelSet::from([(RECOMMENDATION_LABEL.to_string(), value.to_string())]);
        match self.nodes.patch_labels(&node.name, &labels).await {
            Ok(()) => {
                info!(
                    node = %node.name,
                    prediction = %signal,
                    value = value,
                    "Updated recommendation label"
                );
                NodeOutcome::Labeled { value }
            }
            Err(e) => {
                error!(
                    node = %node.name,
                    error = %format!("{:#}", e),
                    "Failed to patch node"
                );
                NodeOutcome::PatchFailed
            }
        }
    }
}

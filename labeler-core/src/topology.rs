//! Topology Labeler
//!
//! Labels the local node with the physical cluster, rack and host of the
//! machine its VM runs on, as reported by the instance metadata service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::LabelError;
use crate::metrics::MetricsRegistry;
use crate::node::NodeApi;
use crate::placement::PhysicalPlacement;
use crate::source::InstanceMetadata;

/// Default pause between topology cycles
pub const DEFAULT_TOPOLOGY_INTERVAL: Duration = Duration::from_secs(600);

/// Labels applied by a successful cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyUpdate {
    /// Node that was patched
    pub node: String,
    /// Placement written to the node
    pub placement: PhysicalPlacement,
}

/// Periodic labeler for the local node's physical placement
pub struct TopologyLabeler {
    metadata: Arc<dyn InstanceMetadata>,
    nodes: Arc<dyn NodeApi>,
    metrics: Arc<MetricsRegistry>,
    interval: Duration,
}

impl TopologyLabeler {
    /// Create a new topology labeler
    pub fn new(
        metadata: Arc<dyn InstanceMetadata>,
        nodes: Arc<dyn NodeApi>,
        metrics: Arc<MetricsRegistry>,
        interval: Duration,
    ) -> Self {
        Self {
            metadata,
            nodes,
            metrics,
            interval,
        }
    }

    /// Fetch placement metadata and patch the local node once
    pub async fn run_cycle(&self) -> Result<TopologyUpdate, LabelError> {
        let node = self
            .metadata
            .instance_name()
            .await
            .map_err(|source| LabelError::Unavailable {
                what: "node name",
                source,
            })?;
        let node = node.trim().to_string();
        if node.is_empty() {
            return Err(LabelError::Malformed {
                what: "node name",
                value: node,
            });
        }

        let raw = self
            .metadata
            .physical_host()
            .await
            .map_err(|source| LabelError::Unavailable {
                what: "physical host",
                source,
            })?;
        let placement = PhysicalPlacement::parse(&raw)?;

        let labels = placement.labels();
        self.nodes
            .patch_labels(&node, &labels)
            .await
            .map_err(|source| LabelError::Patch {
                node: node.clone(),
                source,
            })?;

        info!(
            node = %node,
            cluster = %placement.cluster,
            rack = %placement.rack,
            host = %placement.host,
            "Updated topology labels"
        );
        Ok(TopologyUpdate { node, placement })
    }

    /// Run one cycle, logging and counting its outcome
    pub async fn run_once(&self) -> Result<TopologyUpdate, LabelError> {
        let result = self.run_cycle().await;
        let outcome = match &result {
            Ok(_) => {
                self.metrics.set_topology_last_success(Utc::now().timestamp());
                "labeled"
            }
            Err(e @ LabelError::Unavailable { .. }) => {
                warn!(error = %e, "Topology metadata not available, skipping cycle");
                "unavailable"
            }
            Err(e @ LabelError::Malformed { .. }) => {
                error!(error = %e, "Topology metadata malformed, skipping cycle");
                "malformed"
            }
            Err(e @ LabelError::Patch { .. }) => {
                error!(error = %e, "Failed to apply topology labels");
                "patch_failed"
            }
        };
        self.metrics.inc_topology_cycle(outcome);
        result
    }

    /// Run cycles at a fixed cadence until shutdown is signalled
    ///
    /// The first cycle runs immediately. Failed cycles are logged and the
    /// next one runs after the same interval.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(interval = ?self.interval, "Starting topology labeler");

        loop {
            info!("Starting node update");
            let _ = self.run_once().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown signal received, stopping topology labeler");
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}

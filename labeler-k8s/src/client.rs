//! Kubernetes Client wrapper
//!
//! Provides the node list and label patch calls the labelers need.

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::Client;
use serde_json::json;
use tracing::{debug, info};

use labeler_core::LabelSet;

/// Field manager recorded on label patches
pub const FIELD_MANAGER: &str = "node-labeler";

/// Kubernetes client wrapper
pub struct K8sClient {
    client: Client,
}

impl K8sClient {
    /// Create a new K8s client using in-cluster config
    pub async fn new() -> Result<Self> {
        let client = Client::try_default()
            .await
            .context("Failed to create Kubernetes client")?;

        info!("Connected to Kubernetes API server");
        Ok(Self { client })
    }

    /// Get node API
    pub fn nodes(&self) -> Api<Node> {
        Api::all(self.client.clone())
    }

    /// List nodes matching a label selector
    pub async fn list_nodes(&self, label_selector: &str) -> Result<Vec<Node>> {
        let params = ListParams::default().labels(label_selector);

        let nodes = self
            .nodes()
            .list(&params)
            .await
            .with_context(|| format!("Failed to list nodes with selector: {}", label_selector))?;

        debug!(selector = label_selector, count = nodes.items.len(), "Listed nodes");
        Ok(nodes.items)
    }

    /// Merge labels into a node's metadata
    pub async fn patch_node_labels(&self, node_name: &str, labels: &LabelSet) -> Result<()> {
        let patch = label_patch(labels);

        let params = PatchParams::apply(FIELD_MANAGER);
        self.nodes()
            .patch(node_name, &params, &Patch::Merge(&patch))
            .await
            .with_context(|| format!("Failed to patch labels on node: {}", node_name))?;

        debug!(node = node_name, labels = ?labels, "Node labels patched");
        Ok(())
    }
}

/// Merge-patch body setting `labels` under `metadata.labels`
pub fn label_patch(labels: &LabelSet) -> serde_json::Value {
    json!({
        "metadata": {
            "labels": labels
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_patch_body() {
        let labels = LabelSet::from([
            ("topology.gke.io/cluster".to_string(), "clusterA".to_string()),
            ("topology.gke.io/rack".to_string(), "rack3".to_string()),
        ]);

        let patch = label_patch(&labels);
        assert_eq!(
            patch,
            json!({
                "metadata": {
                    "labels": {
                        "topology.gke.io/cluster": "clusterA",
                        "topology.gke.io/rack": "rack3"
                    }
                }
            })
        );
    }

    #[test]
    fn test_label_patch_touches_only_labels() {
        let labels = LabelSet::from([("k".to_string(), "v".to_string())]);
        let patch = label_patch(&labels);

        let object = patch.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(patch["metadata"].as_object().unwrap().len(), 1);
    }
}

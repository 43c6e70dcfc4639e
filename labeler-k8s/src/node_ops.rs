//! Node Operations
//!
//! Implements the labelers' node API on top of the Kubernetes client,
//! with an optional dry-run mode.

use anyhow::Result;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use tracing::info;

use super::client::K8sClient;
use labeler_core::{LabelSet, NodeApi, NodeRecord};

/// Node operator for label updates
pub struct NodeOperator {
    client: K8sClient,
    dry_run: bool,
}

impl NodeOperator {
    /// Create a new node operator
    pub fn new(client: K8sClient, dry_run: bool) -> Self {
        Self { client, dry_run }
    }
}

#[async_trait]
impl NodeApi for NodeOperator {
    async fn list_nodes(&self, label_selector: &str) -> Result<Vec<NodeRecord>> {
        let nodes = self.client.list_nodes(label_selector).await?;
        Ok(nodes.iter().map(node_record).collect())
    }

    async fn patch_labels(&self, node_name: &str, labels: &LabelSet) -> Result<()> {
        if self.dry_run {
            info!(
                node = node_name,
                labels = ?labels,
                "[DRY-RUN] Would patch node labels"
            );
            return Ok(());
        }

        self.client.patch_node_labels(node_name, labels).await
    }
}

/// Project a Kubernetes node onto the fields the labelers read
pub fn node_record(node: &Node) -> NodeRecord {
    NodeRecord {
        name: node.metadata.name.clone().unwrap_or_default(),
        provider_id: node.spec.as_ref().and_then(|s| s.provider_id.clone()),
        labels: node.metadata.labels.clone().unwrap_or_default(),
    }
}

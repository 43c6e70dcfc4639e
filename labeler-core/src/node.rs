//! Node view and node update API

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::labels::{LabelSet, GCE_PROVIDER_PREFIX, ZONE_LABEL};

/// The parts of a Kubernetes node the labelers read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeRecord {
    /// Node name
    pub name: String,
    /// `spec.providerID`
    pub provider_id: Option<String>,
    /// `metadata.labels`
    pub labels: BTreeMap<String, String>,
}

impl NodeRecord {
    /// Create a node record without provider ID or labels
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the provider ID
    pub fn with_provider_id(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Zone from the well-known zone label, if set and non-empty
    pub fn zone(&self) -> Option<&str> {
        self.labels
            .get(ZONE_LABEL)
            .map(String::as_str)
            .filter(|z| !z.is_empty())
    }
}

/// Why a provider ID could not be turned into an instance name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderIdError {
    /// The node has no provider ID
    Missing,
    /// The node is not backed by Compute Engine
    NotGce(String),
    /// The provider ID has no trailing instance segment
    Malformed(String),
}

impl std::fmt::Display for ProviderIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderIdError::Missing => write!(f, "missing providerID"),
            ProviderIdError::NotGce(id) => write!(f, "non-GCE providerID {:?}", id),
            ProviderIdError::Malformed(id) => write!(f, "malformed providerID {:?}", id),
        }
    }
}

/// Extract the instance name from a `gce://<project>/<zone>/<instance>` provider ID
///
/// The instance name is the trailing path segment.
pub fn gce_instance_name(provider_id: Option<&str>) -> Result<&str, ProviderIdError> {
    let id = provider_id
        .filter(|id| !id.is_empty())
        .ok_or(ProviderIdError::Missing)?;

    let path = id
        .strip_prefix(GCE_PROVIDER_PREFIX)
        .ok_or_else(|| ProviderIdError::NotGce(id.to_string()))?;

    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(ProviderIdError::Malformed(id.to_string())),
    }
}

/// Kubernetes node list and label patch operations
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// List nodes matching a label selector
    async fn list_nodes(&self, label_selector: &str) -> Result<Vec<NodeRecord>>;

    /// Merge `labels` into the node's `metadata.labels`
    async fn patch_labels(&self, node_name: &str, labels: &LabelSet) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gce_instance_name() {
        assert_eq!(
            gce_instance_name(Some("gce://proj/us-central1-a/inst-9")),
            Ok("inst-9")
        );
    }

    #[test]
    fn test_gce_instance_name_rejects() {
        assert_eq!(gce_instance_name(None), Err(ProviderIdError::Missing));
        assert_eq!(gce_instance_name(Some("")), Err(ProviderIdError::Missing));
        assert_eq!(
            gce_instance_name(Some("aws:///us-east-1a/i-0abc")),
            Err(ProviderIdError::NotGce("aws:///us-east-1a/i-0abc".to_string()))
        );
        assert_eq!(
            gce_instance_name(Some("gce://proj/zone/")),
            Err(ProviderIdError::Malformed("gce://proj/zone/".to_string()))
        );
        assert_eq!(
            gce_instance_name(Some("gce://")),
            Err(ProviderIdError::Malformed("gce://".to_string()))
        );
    }

    #[test]
    fn test_zone() {
        let node = NodeRecord::new("n1").with_label(ZONE_LABEL, "us-central1-a");
        assert_eq!(node.zone(), Some("us-central1-a"));

        let node = NodeRecord::new("n2").with_label(ZONE_LABEL, "");
        assert_eq!(node.zone(), None);
        assert_eq!(NodeRecord::new("n3").zone(), None);
    }
}

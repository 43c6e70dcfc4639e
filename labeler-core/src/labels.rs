//! Well-known label keys, selectors and cloud identifiers

use std::collections::BTreeMap;

/// Labels applied to a node in a single merge-patch
pub type LabelSet = BTreeMap<String, String>;

/// Physical cluster the node's host belongs to
pub const TOPOLOGY_CLUSTER_LABEL: &str = "topology.gke.io/cluster";

/// Rack the node's host sits in
pub const TOPOLOGY_RACK_LABEL: &str = "topology.gke.io/rack";

/// Physical host running the node's VM
pub const TOPOLOGY_HOST_LABEL: &str = "topology.gke.io/host";

/// Whether the node is fit for large training workloads ("True"/"False")
pub const RECOMMENDATION_LABEL: &str = "gke.io/recommended-to-run-large-training-workload";

/// Selects GPU-bearing nodes
pub const GPU_NODE_SELECTOR: &str = "cloud.google.com/gke-gpu=true";

/// Zone the node runs in
pub const ZONE_LABEL: &str = "topology.kubernetes.io/zone";

/// Provider ID prefix of Compute Engine backed nodes
pub const GCE_PROVIDER_PREFIX: &str = "gce://";

/// Monitoring metric carrying the GPU failure prediction
pub const FAILURE_PREDICTION_METRIC: &str =
    "compute.googleapis.com/instance/gpu/failure_prediction_status";

/// Monitored resource type of Compute Engine instances
pub const GCE_INSTANCE_RESOURCE: &str = "gce_instance";

/// Metric label holding the prediction value
pub const PREDICTION_VALUE_LABEL: &str = "Value";

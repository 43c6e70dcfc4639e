//! GKE Node Labeler Kubernetes Integration
//!
//! Provides the Kubernetes client and node operations for the node labelers.

pub mod client;
pub mod node_ops;

pub use client::K8sClient;
pub use node_ops::NodeOperator;

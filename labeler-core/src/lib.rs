//! GKE Node Labeler Core Library
//!
//! Label decision logic for the GKE node labelers.
//! This crate provides placement parsing, prediction mapping, the dependency
//! traits for cloud and cluster APIs, and the two labelers built on them.

pub mod error;
pub mod labels;
pub mod metrics;
pub mod mock;
pub mod node;
pub mod placement;
pub mod prediction;
pub mod predictor;
pub mod source;
pub mod topology;

// Re-export common types
pub use error::{CloudError, LabelError};
pub use labels::LabelSet;
pub use node::{NodeApi, NodeRecord};
pub use placement::PhysicalPlacement;
pub use prediction::PredictionSignal;
pub use predictor::{NodeOutcome, PassSummary, PredictionLabeler, PredictorConfig};
pub use source::{InstanceLookup, InstanceMetadata, TimeSeries, TimeSeriesSource, TimeWindow};
pub use topology::{TopologyLabeler, TopologyUpdate};

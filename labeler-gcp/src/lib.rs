//! GKE Node Labeler Google Cloud Integration
//!
//! HTTP clients for the instance metadata server, the Compute Engine API and
//! the Cloud Monitoring API, implementing the `labeler-core` source traits.

pub mod auth;
pub mod compute;
pub mod http;
pub mod metadata;
pub mod monitoring;

pub use auth::TokenSource;
pub use compute::ComputeClient;
pub use http::build_http_client;
pub use metadata::MetadataClient;
pub use monitoring::MonitoringClient;

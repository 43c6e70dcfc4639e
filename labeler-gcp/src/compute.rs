//! Compute Engine instance lookup

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::auth::TokenSource;
use crate::http;
use labeler_core::{CloudError, InstanceLookup};

/// Compute Engine API endpoint
pub const DEFAULT_COMPUTE_URL: &str = "https://compute.googleapis.com";

const ENDPOINT: &str = "compute/instances.get";

#[derive(Debug, Deserialize)]
struct InstanceDetails {
    /// uint64 encoded as a JSON string
    #[serde(default)]
    id: Option<Value>,
}

impl InstanceDetails {
    fn instance_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(id) if !id.is_empty() => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }
}

/// Compute Engine API client
pub struct ComputeClient {
    http: Client,
    base_url: String,
    tokens: Arc<TokenSource>,
}

impl ComputeClient {
    /// Create a client for the Compute API at `base_url`
    pub fn new(http: Client, base_url: impl Into<String>, tokens: Arc<TokenSource>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            tokens,
        }
    }
}

#[async_trait]
impl InstanceLookup for ComputeClient {
    async fn instance_id(
        &self,
        project: &str,
        zone: &str,
        instance: &str,
    ) -> Result<Option<String>, CloudError> {
        let url = http::join(
            &self.base_url,
            &format!(
                "compute/v1/projects/{}/zones/{}/instances/{}",
                project, zone, instance
            ),
        );
        debug!(project = project, zone = zone, instance = instance, "Looking up instance");

        let token = self.tokens.token().await?;
        let response = http::send(self.http.get(url).bearer_auth(token), ENDPOINT).await?;
        let details: InstanceDetails = http::json(response, ENDPOINT).await?;
        Ok(details.instance_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const INSTANCE_PATH: &str =
        "/compute/v1/projects/proj/zones/us-central1-a/instances/inst-9";

    fn client(server: &MockServer) -> ComputeClient {
        ComputeClient::new(
            Client::new(),
            server.uri(),
            Arc::new(TokenSource::Static("tok".to_string())),
        )
    }

    #[tokio::test]
    async fn test_instance_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(INSTANCE_PATH))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "kind": "compute#instance",
                "id": "123456",
                "name": "inst-9"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let id = assert_ok!(client(&server).instance_id("proj", "us-central1-a", "inst-9").await);
        assert_eq!(id.as_deref(), Some("123456"));
    }

    #[tokio::test]
    async fn test_numeric_instance_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(INSTANCE_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": 123456 })),
            )
            .mount(&server)
            .await;

        let id = client(&server)
            .instance_id("proj", "us-central1-a", "inst-9")
            .await
            .unwrap();
        assert_eq!(id.as_deref(), Some("123456"));
    }

    #[tokio::test]
    async fn test_missing_instance_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(INSTANCE_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "name": "inst-9" })),
            )
            .mount(&server)
            .await;

        let id = client(&server)
            .instance_id("proj", "us-central1-a", "inst-9")
            .await
            .unwrap();
        assert_eq!(id, None);
    }

    #[tokio::test]
    async fn test_lookup_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(INSTANCE_PATH))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = assert_err!(client(&server).instance_id("proj", "us-central1-a", "inst-9").await);
        assert_eq!(err.status(), Some(403));
    }
}

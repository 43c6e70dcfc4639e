//! Compute Engine instance metadata server client
//!
//! All requests carry `Metadata-Flavor: Google`; values come back as plain
//! text except the access token, which is JSON.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::http;
use labeler_core::{CloudError, InstanceMetadata};

/// Metadata server reachable from every Compute Engine VM
pub const DEFAULT_METADATA_URL: &str = "http://metadata.google.internal";

const METADATA_FLAVOR_HEADER: &str = "Metadata-Flavor";
const METADATA_FLAVOR: &str = "Google";

const INSTANCE_NAME_PATH: &str = "instance/name";
const PHYSICAL_HOST_PATH: &str = "instance/attributes/physical_host";
const PROJECT_ID_PATH: &str = "project/project-id";
const TOKEN_PATH: &str = "instance/service-accounts/default/token";

#[derive(Debug, Deserialize)]
struct AccessToken {
    access_token: String,
}

/// Metadata server client
#[derive(Debug, Clone)]
pub struct MetadataClient {
    http: Client,
    base_url: String,
}

impl MetadataClient {
    /// Create a client for the metadata server at `base_url`
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        http::join(&self.base_url, &format!("computeMetadata/v1/{}", path))
    }

    async fn get_text(&self, path: &str) -> Result<String, CloudError> {
        debug!(path = path, "Querying metadata server");
        let request = self
            .http
            .get(self.url(path))
            .header(METADATA_FLAVOR_HEADER, METADATA_FLAVOR);
        let response = http::send(request, path).await?;
        http::text(response, path).await
    }

    /// Project the VM belongs to
    pub async fn project_id(&self) -> Result<String, CloudError> {
        let project = self.get_text(PROJECT_ID_PATH).await?;
        let project = project.trim();
        if project.is_empty() {
            return Err(CloudError::Decode {
                endpoint: PROJECT_ID_PATH.to_string(),
                message: "empty project ID".to_string(),
            });
        }
        Ok(project.to_string())
    }

    /// OAuth access token of the VM's default service account
    pub async fn access_token(&self) -> Result<String, CloudError> {
        let request = self
            .http
            .get(self.url(TOKEN_PATH))
            .header(METADATA_FLAVOR_HEADER, METADATA_FLAVOR);
        let response = http::send(request, TOKEN_PATH).await?;
        let token: AccessToken = http::json(response, TOKEN_PATH).await?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl InstanceMetadata for MetadataClient {
    async fn instance_name(&self) -> Result<String, CloudError> {
        self.get_text(INSTANCE_NAME_PATH).await
    }

    async fn physical_host(&self) -> Result<String, CloudError> {
        self.get_text(PHYSICAL_HOST_PATH).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_err;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve_text(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("Metadata-Flavor", "Google"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_instance_name_and_physical_host() {
        let server = MockServer::start().await;
        serve_text(&server, "/computeMetadata/v1/instance/name", "node-42").await;
        serve_text(
            &server,
            "/computeMetadata/v1/instance/attributes/physical_host",
            "/clusterA/rack3/host7",
        )
        .await;

        let client = MetadataClient::new(Client::new(), server.uri());
        assert_eq!(client.instance_name().await.unwrap(), "node-42");
        assert_eq!(
            client.physical_host().await.unwrap(),
            "/clusterA/rack3/host7"
        );
    }

    #[tokio::test]
    async fn test_missing_attribute_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/computeMetadata/v1/instance/attributes/physical_host"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = MetadataClient::new(Client::new(), server.uri());
        let err = assert_err!(client.physical_host().await);
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_project_id_is_trimmed() {
        let server = MockServer::start().await;
        serve_text(&server, "/computeMetadata/v1/project/project-id", "my-proj\n").await;

        let client = MetadataClient::new(Client::new(), server.uri());
        assert_eq!(client.project_id().await.unwrap(), "my-proj");
    }

    #[tokio::test]
    async fn test_empty_project_id_is_rejected() {
        let server = MockServer::start().await;
        serve_text(&server, "/computeMetadata/v1/project/project-id", "").await;

        let client = MetadataClient::new(Client::new(), server.uri());
        assert!(matches!(
            client.project_id().await,
            Err(CloudError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn test_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/computeMetadata/v1/instance/service-accounts/default/token",
            ))
            .and(header("Metadata-Flavor", "Google"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.token",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;

        let client = MetadataClient::new(Client::new(), server.uri());
        assert_eq!(client.access_token().await.unwrap(), "ya29.token");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_request_error() {
        let client = MetadataClient::new(Client::new(), "http://127.0.0.1:1");
        assert!(matches!(
            client.instance_name().await,
            Err(CloudError::Request { .. })
        ));
    }
}

//! Shared HTTP plumbing for the Google Cloud clients

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use labeler_core::CloudError;

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the HTTP client shared by all Google Cloud clients
pub fn build_http_client(timeout: Duration) -> Result<Client, CloudError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CloudError::Request {
            endpoint: "http client".to_string(),
            message: e.to_string(),
        })
}

/// Send a request and reject non-success responses
pub(crate) async fn send(request: RequestBuilder, endpoint: &str) -> Result<Response, CloudError> {
    let response = request.send().await.map_err(|e| CloudError::Request {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(CloudError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(response)
}

/// Read a response body as text
pub(crate) async fn text(response: Response, endpoint: &str) -> Result<String, CloudError> {
    response.text().await.map_err(|e| CloudError::Decode {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

/// Read a response body as JSON
pub(crate) async fn json<T: DeserializeOwned>(
    response: Response,
    endpoint: &str,
) -> Result<T, CloudError> {
    response.json::<T>().await.map_err(|e| CloudError::Decode {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

/// Join a base URL and a path without doubling slashes
pub(crate) fn join(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join() {
        assert_eq!(
            join("http://metadata.google.internal/", "/computeMetadata/v1/instance/name"),
            "http://metadata.google.internal/computeMetadata/v1/instance/name"
        );
        assert_eq!(join("http://a", "b/c"), "http://a/b/c");
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(DEFAULT_REQUEST_TIMEOUT).is_ok());
    }
}

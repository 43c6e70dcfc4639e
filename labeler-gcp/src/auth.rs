//! Bearer tokens for the Google Cloud APIs

use tracing::debug;

use crate::metadata::MetadataClient;
use labeler_core::CloudError;

/// Environment variable holding a pre-issued access token
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Where access tokens come from
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// A fixed token
    Static(String),
    /// The VM's default service account via the metadata server
    Metadata(MetadataClient),
}

impl TokenSource {
    /// Use `ACCESS_TOKEN_ENV` when set, the metadata server otherwise
    pub fn from_env_or(metadata: MetadataClient) -> Self {
        match std::env::var(ACCESS_TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => {
                debug!("Using access token from environment");
                TokenSource::Static(token.trim().to_string())
            }
            _ => TokenSource::Metadata(metadata),
        }
    }

    /// Current access token
    pub async fn token(&self) -> Result<String, CloudError> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::Metadata(metadata) => metadata
                .access_token()
                .await
                .map_err(|e| CloudError::Auth(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;

    #[tokio::test]
    async fn test_static_token() {
        let source = TokenSource::Static("tok".to_string());
        assert_eq!(source.token().await.unwrap(), "tok");
    }

    #[tokio::test]
    async fn test_metadata_failure_is_auth_error() {
        let source = TokenSource::Metadata(MetadataClient::new(Client::new(), "http://127.0.0.1:1"));
        assert!(matches!(source.token().await, Err(CloudError::Auth(_))));
    }
}

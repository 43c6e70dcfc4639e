//! Error types shared by the labelers and their dependency traits.

use thiserror::Error;

/// Errors returned by external fact sources (metadata server, Compute, Monitoring)
#[derive(Debug, Error)]
pub enum CloudError {
    /// The request could not be sent or the connection failed
    #[error("Request to {endpoint} failed: {message}")]
    Request { endpoint: String, message: String },

    /// The service answered with a non-success status
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    /// The response body could not be decoded
    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// Credentials could not be obtained
    #[error("Failed to obtain credentials: {0}")]
    Auth(String),
}

impl CloudError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            CloudError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors from a single labeling unit of work
#[derive(Debug, Error)]
pub enum LabelError {
    /// An upstream fact could not be fetched
    #[error("{what} unavailable: {source}")]
    Unavailable {
        what: &'static str,
        #[source]
        source: CloudError,
    },

    /// A fetched fact did not have the expected shape
    #[error("Malformed {what}: {value:?}")]
    Malformed { what: &'static str, value: String },

    /// The node patch was rejected or could not be sent
    #[error("Failed to patch node {node}: {source:#}")]
    Patch {
        node: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloud_error_status() {
        let err = CloudError::Status {
            endpoint: "instance/name".to_string(),
            status: 404,
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "instance/name returned HTTP 404");

        let err = CloudError::Auth("no token".to_string());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_label_error_kinds() {
        let malformed = LabelError::Malformed {
            what: "physical host",
            value: "a/b".to_string(),
        };
        assert!(matches!(malformed, LabelError::Malformed { .. }));
        assert!(malformed.to_string().contains("\"a/b\""));

        let unavailable = LabelError::Unavailable {
            what: "node name",
            source: CloudError::Status {
                endpoint: "instance/name".to_string(),
                status: 503,
            },
        };
        assert!(!matches!(unavailable, LabelError::Malformed { .. }));
        assert!(unavailable.to_string().starts_with("node name unavailable"));
    }

    #[test]
    fn test_patch_error_shows_cause_chain() {
        let err = LabelError::Patch {
            node: "gke-n1".to_string(),
            source: anyhow::anyhow!("HTTP 500").context("Failed to patch node labels"),
        };
        let message = err.to_string();
        assert!(message.starts_with("Failed to patch node gke-n1"));
        assert!(message.contains("Failed to patch node labels"));
        assert!(message.contains("HTTP 500"));
    }
}

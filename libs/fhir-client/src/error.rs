//! Error types for fhir-client

use ferrum_models::{peek_resource_type, OperationOutcome, TypedResource};
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// FHIR client errors
#[derive(Error, Debug)]
pub enum Error {
    /// The response body could not be decoded into a resource.
    #[error(transparent)]
    Model(#[from] ferrum_models::Error),

    /// The server answered with a status outside 200..300.
    #[error("Server returned error status {status}: {body}")]
    RemoteOperationFailed { status: u16, body: String },

    /// No status was obtained: connection, TLS, timeout or body read failure.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Unsupported FHIR version: {0}")]
    UnsupportedVersion(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

impl Error {
    /// HTTP status of a failed remote operation
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::RemoteOperationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// OperationOutcome carried by a failed remote operation's body, if it holds one
    pub fn outcome(&self) -> Option<OperationOutcome> {
        match self {
            Error::RemoteOperationFailed { body, .. } => {
                let resource_type = peek_resource_type(body.as_bytes()).ok()?;
                if resource_type != OperationOutcome::TYPE_NAME {
                    return None;
                }
                serde_json::from_str(body).ok()
            }
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrum_models::IssueType;

    #[test]
    fn test_outcome_from_error_body() {
        let err = Error::RemoteOperationFailed {
            status: 404,
            body: r#"{"resourceType":"OperationOutcome","issue":[{"severity":"error","code":"not-found"}]}"#
                .to_string(),
        };
        assert!(err.is_not_found());
        let outcome = err.outcome().unwrap();
        assert_eq!(outcome.issue[0].code, IssueType::NotFound);
    }

    #[test]
    fn test_non_outcome_body() {
        let err = Error::RemoteOperationFailed {
            status: 502,
            body: "<html>Bad Gateway</html>".to_string(),
        };
        assert_eq!(err.status(), Some(502));
        assert!(err.outcome().is_none());
    }
}

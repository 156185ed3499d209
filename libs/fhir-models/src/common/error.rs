//! Error types for FHIR models

use super::temporal::TemporalKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The payload is not well-formed JSON, or its `resourceType` is absent or not a string.
    #[error("Malformed payload: {0}")]
    MalformedPayload(#[source] serde_json::Error),

    /// No constructor is registered for the payload's `resourceType`.
    #[error("Unsupported resource type: {0}")]
    UnsupportedType(String),

    /// A field of a recognized resource did not match its declared shape.
    #[error("Failed to decode {resource_type}: {source}")]
    FieldDecode {
        resource_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid {kind} value: {value:?}")]
    InvalidTemporalValue { kind: TemporalKind, value: String },

    #[error("Expected resource type {expected}, got {actual}")]
    UnexpectedResourceType { expected: String, actual: String },

    #[error("Bundle entry {index}: {source}")]
    BundleEntry {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error (or the bundle entry error it wraps) came from an
    /// unregistered discriminator.
    pub fn is_unsupported_type(&self) -> bool {
        match self {
            Error::UnsupportedType(_) => true,
            Error::BundleEntry { source, .. } => source.is_unsupported_type(),
            _ => false,
        }
    }
}

//! Error types for Regimen.

use thiserror::Error;

use crate::types::EntryPoint;

/// Main error type for Regimen operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegimenError {
    /// Routine generation was triggered with nothing selected.
    #[error("No products selected")]
    EmptySelection,

    /// A question was submitted with no text.
    #[error("Message is empty")]
    EmptyMessage,

    /// The entry point already has a request outstanding.
    #[error("A {entry} request is already in progress")]
    Busy { entry: EntryPoint },

    /// Clearing the selection was requested without confirmation.
    #[error("Clearing the selection requires confirmation")]
    NotConfirmed,

    /// The catalog could not be fetched.
    #[error("Catalog fetch failed: {0}")]
    CatalogFetch(String),

    /// The catalog document could not be parsed.
    #[error("Catalog parse failed: {0}")]
    CatalogParse(String),

    /// The completion endpoint answered with a non-success status.
    #[error("API request failed: {status}")]
    CompletionStatus { status: u16, body: String },

    /// The completion endpoint could not be reached.
    #[error("API request failed: {0}")]
    CompletionTransport(String),

    /// The completion endpoint answered with an unexpected body.
    #[error("Malformed completion response: {0}")]
    MalformedCompletion(String),

    /// Durable storage failed.
    #[error("Storage error on slot '{slot}': {message}")]
    Storage { slot: String, message: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The node rejected a request.
    #[error("{title}: {message}")]
    Remote {
        status: u16,
        title: String,
        message: String,
    },

    /// Connection error.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Internal error (should not happen).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RegimenError {
    /// Returns true if triggering the same action again could succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            RegimenError::Busy { .. } => true,
            RegimenError::CompletionStatus { .. } => true,
            RegimenError::CompletionTransport(_) => true,
            RegimenError::CatalogFetch(_) => true,
            RegimenError::ConnectionError(_) => true,
            RegimenError::Remote { status, .. } => *status >= 500 || *status == 409,
            _ => false,
        }
    }

    /// Returns true if the request was refused before any state changed.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            RegimenError::EmptySelection
                | RegimenError::EmptyMessage
                | RegimenError::Busy { .. }
                | RegimenError::NotConfirmed
        )
    }

    /// Returns true if the failure came from the completion endpoint.
    pub fn is_completion_failure(&self) -> bool {
        matches!(
            self,
            RegimenError::CompletionStatus { .. }
                | RegimenError::CompletionTransport(_)
                | RegimenError::MalformedCompletion(_)
        )
    }
}

/// Convenience Result type for Regimen operations.
pub type Result<T> = std::result::Result<T, RegimenError>;

impl From<serde_json::Error> for RegimenError {
    fn from(err: serde_json::Error) -> Self {
        RegimenError::SerializationError(err.to_string())
    }
}

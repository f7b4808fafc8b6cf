//! Error types for JSON issue document operations.

use issue_board_app::StoreError;
use issue_board_core::id::{BridgeId, IssueId};
use thiserror::Error;

/// Errors that can occur during `JsonIssueStore` operations.
#[derive(Error, Debug)]
pub enum JsonStoreError {
    /// Issue was not found in the document.
    #[error("Issue not found: {0}")]
    IssueNotFound(IssueId),

    /// The bridge record does not link the issue to the scope.
    #[error("Issue {issue} is not attached through bridge {bridge}")]
    BridgeMismatch {
        /// Issue being detached.
        issue: IssueId,
        /// Bridge named by the caller.
        bridge: BridgeId,
    },

    /// The scope cannot perform the operation.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Failed to parse the document.
    #[error("Failed to parse issue document: {0}")]
    ParseError(String),

    /// Failed to serialize the document.
    #[error("Failed to serialize issue document: {0}")]
    SerializeError(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Other unclassified error.
    #[error("Other error: {0}")]
    Other(String),
}

impl From<anyhow::Error> for JsonStoreError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<JsonStoreError> for StoreError {
    fn from(err: JsonStoreError) -> Self {
        match err {
            JsonStoreError::IssueNotFound(issue) => Self::NotFound(issue),
            JsonStoreError::BridgeMismatch { .. } | JsonStoreError::Unsupported(_) => {
                Self::validation(err.to_string())
            }
            other => Self::remote(other),
        }
    }
}

//! Errors surfaced by the issue store and filter persistence.

use issue_board_core::id::IssueId;
use thiserror::Error;

/// Coarse category of a failure, used to decide how it is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A remote request failed; the affected scope has been re-fetched.
    Network,
    /// The request was rejected before or by the server; shown inline.
    Validation,
    /// The issue is not part of the cached collection.
    NotFound,
    /// Reading or writing persisted filters failed.
    Storage,
}

/// Error returned by [`IssueStore`](crate::store::IssueStore) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The endpoint failed to complete the request.
    #[error("remote request failed: {0}")]
    Remote(String),
    /// The request was rejected as invalid.
    #[error("invalid request: {0}")]
    Validation(String),
    /// The issue is unknown to the scope.
    #[error("issue {0} not found")]
    NotFound(IssueId),
    /// Filter persistence failed.
    #[error("filter storage failed: {0}")]
    Storage(String),
}

impl StoreError {
    /// Build a remote failure from any displayable error.
    pub fn remote(err: impl std::fmt::Display) -> Self {
        Self::Remote(err.to_string())
    }

    /// Build a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Category of the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Remote(_) => ErrorKind::Network,
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Short message suitable for a transient notification.
    #[must_use]
    pub fn describe_user_facing(&self) -> String {
        match self {
            Self::Remote(_) => "Something went wrong. Please try again.".to_owned(),
            Self::Validation(message) => message.clone(),
            Self::NotFound(_) => "This issue no longer exists.".to_owned(),
            Self::Storage(_) => "Your view settings could not be saved.".to_owned(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_failures_hide_details_from_users() {
        let err = StoreError::remote("connection reset by peer");
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.to_string().contains("connection reset"));
        assert!(!err.describe_user_facing().contains("connection reset"));
    }

    #[test]
    fn validation_messages_are_shown_verbatim() {
        let err = StoreError::validation("identifier already taken");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.describe_user_facing(), "identifier already taken");
    }
}

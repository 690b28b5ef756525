//! Error types for notebook lifecycle operations.

use thiserror::Error;

/// Main error type for Decipher operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecipherError {
    /// No session, or the session token is not recognised.
    #[error("Unauthorized")]
    Unauthorized,

    /// Resource is absent, or exists but belongs to someone else.
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// Creation or update input is malformed.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// The operation is not allowed in the notebook's current state.
    #[error("Precondition failed: {message}")]
    Precondition { message: String },

    /// The external research service returned non-2xx or was unreachable.
    #[error("Upstream call to {endpoint} failed: {message}")]
    Upstream {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },

    /// A local store operation failed.
    #[error("Persistence error: {message}")]
    Persistence { message: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Connection error talking to a Decipher node.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Internal error (should not happen).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DecipherError {
    /// Shorthand for a notebook lookup that found nothing visible to the caller.
    pub fn notebook_not_found(id: impl ToString) -> Self {
        DecipherError::NotFound {
            resource: "Notebook".to_string(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        DecipherError::Validation {
            message: message.into(),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        DecipherError::Precondition {
            message: message.into(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        DecipherError::Persistence {
            message: message.into(),
        }
    }

    /// Returns true if the caller can reasonably try the same call again.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            DecipherError::Upstream { .. } | DecipherError::Connection(_)
        )
    }

    /// Upstream detail worth surfacing next to the short user-facing message.
    pub fn upstream_detail(&self) -> Option<String> {
        match self {
            DecipherError::Upstream {
                status: Some(code),
                message,
                ..
            } => Some(format!("{code} - {message}")),
            DecipherError::Upstream { message, .. } => Some(message.clone()),
            _ => None,
        }
    }
}

/// Convenience Result type for Decipher operations.
pub type Result<T> = std::result::Result<T, DecipherError>;

impl From<serde_json::Error> for DecipherError {
    fn from(err: serde_json::Error) -> Self {
        DecipherError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_detail() {
        let err = DecipherError::Upstream {
            endpoint: "/research".to_string(),
            status: Some(503),
            message: "busy".to_string(),
        };
        assert_eq!(err.upstream_detail().as_deref(), Some("503 - busy"));
        assert!(err.is_retriable());
        assert!(DecipherError::notebook_not_found("x").upstream_detail().is_none());
    }

    #[test]
    fn test_not_found_display() {
        let err = DecipherError::notebook_not_found("abc");
        assert_eq!(err.to_string(), "Notebook not found: abc");
        assert!(!err.is_retriable());
    }
}

//! Error types for PLM operations

use thiserror::Error;

/// Errors raised by an operation service implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlmError {
    #[error("Item not found: {id}")]
    NotFound { id: String },

    #[error("Item already exists: {id}")]
    AlreadyExists { id: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("Operation not supported: {operation}")]
    Unsupported { operation: String },

    #[error("Authentication failed: {reason}")]
    Unauthenticated { reason: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("PLM backend failure: {message}")]
    Backend { message: String },
}

impl PlmError {
    /// Shorthand for a backend failure carrying a free-form message.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }
}

/// Result type for PLM operations.
pub type PlmResult<T> = Result<T, PlmError>;

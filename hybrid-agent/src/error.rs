//! Error types for the hybrid agent

use hybrid_core::PlmError;
use hybrid_proto::Request;
use thiserror::Error;
use tonic::Code;

/// Errors raised while receiving, routing or answering hub requests.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Failed to map request to notification object: {request:?}")]
    MappingFailed { request: Box<Request> },

    #[error("PLM service error: {0}")]
    Service(#[from] PlmError),

    #[error("Hub call failed: {0}")]
    Hub(#[from] tonic::Status),

    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("Reply stream {method} closed by the hub")]
    ReplyStreamClosed { method: &'static str },

    #[error("Reply call {method} did not finish: {reason}")]
    ReplyTask { method: &'static str, reason: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid configuration for {field}: {reason}")]
    Config { field: String, reason: String },

    #[error("Telemetry initialization failed: {reason}")]
    Telemetry { reason: String },
}

impl AgentError {
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether the hub call ran past its deadline.
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, AgentError::Hub(status) if status.code() == Code::DeadlineExceeded)
    }

    /// Whether the error signals cancellation rather than a failure.
    pub fn is_cancellation(&self) -> bool {
        match self {
            AgentError::Cancelled | AgentError::Service(PlmError::Cancelled) => true,
            AgentError::Hub(status) => status.code() == Code::Cancelled,
            _ => false,
        }
    }
}

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

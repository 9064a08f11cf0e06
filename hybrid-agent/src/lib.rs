//! Hybrid Agent - Reverse-Connection PLM Connector
//!
//! The agent dials out to the hub, keeps a long-lived request stream open,
//! and answers every request by calling a local [`PlmService`]. Replies go
//! back to the hub as unary or client-streaming calls tagged with the
//! request's correlation id.
//!
//! The path of one request: [`ReverseAgent`] reads it, [`route`] turns it
//! into a [`UnitOfWork`], and the [`Dispatcher`] runs the matching handler.
//! [`HybridAgentService`] starts and stops the whole loop.
//!
//! [`PlmService`]: hybrid_core::PlmService

pub mod agent;
pub mod config;
pub mod constants;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod lifecycle;
pub mod metrics;
pub mod retry;
pub mod router;
pub mod telemetry;

// Re-export commonly used types
pub use agent::ReverseAgent;
pub use config::AgentConfig;
pub use dispatcher::Dispatcher;
pub use error::{AgentError, AgentResult};
pub use handlers::HandlerContext;
pub use hub::{GrpcHubClient, HubClient, InboundStream, ReplyStream};
pub use lifecycle::HybridAgentService;
pub use metrics::{AgentMetrics, AgentMetricsSnapshot};
pub use retry::RetryPolicy;
pub use router::{route, OperationKind, Payload, UnitOfWork};

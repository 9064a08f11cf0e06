//! Hybrid Proto - Hub Wire Contract
//!
//! Protocol Buffer messages exchanged with the hub, the generated hub client,
//! typed descriptors for the hub's reply calls, and conversions to and from
//! the `hybrid-core` domain model. Everything under [`custom`] and
//! [`reverse`] is generated at build time from `proto/custom.proto` and
//! `proto/reverse.proto`.

pub mod convert;
pub mod custom;
pub mod methods;

pub use custom::reverse;
pub use methods::{StreamingMethod, UnaryMethod};
pub use reverse::{Envelope, Request};

/// Metadata key carrying the correlation id on every reply call.
pub const CORRELATION_ID_KEY: &str = "correlation-id";

//! Constants for the hybrid agent
//!
//! Defaults for every configurable value, plus the metadata keys the hub
//! expects on each call.

// ============================================================================
// HUB CALLS
// ============================================================================

/// Default per-call deadline in seconds.
pub const DEFAULT_DEADLINE_SECS: u64 = 30;

/// Metadata key for the API key attached to every call.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Metadata key for the tenant id, when configured.
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

/// Metadata key identifying this agent instance to the hub.
pub const AGENT_ID_HEADER: &str = "x-agent-id";

// ============================================================================
// RETRY POLICY
// ============================================================================

/// Attempts per call, including the first one.
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 5;

pub const DEFAULT_RETRY_INITIAL_BACKOFF_SECS: f64 = 1.0;

pub const DEFAULT_RETRY_MAX_BACKOFF_SECS: f64 = 5.0;

/// Growth factor between consecutive backoffs.
pub const DEFAULT_RETRY_BACKOFF_MULTIPLIER: f64 = 1.5;

// ============================================================================
// RECEIVE LOOP
// ============================================================================

/// Pause before reconnecting after an unexpected receive-loop failure.
pub const DEFAULT_ON_EXCEPTION_TIMEOUT_SECS: f64 = 2.0;

/// Requests processed concurrently before the loop stops reading.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 256;

/// Buffer of each client-streaming reply call.
pub const REPLY_STREAM_BUFFER: usize = 16;

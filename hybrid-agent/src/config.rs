//! Agent configuration.
//!
//! Every value comes from a `HYBRID_AGENT_*` environment variable with a
//! default from [`crate::constants`]. Only the hub URI is required.

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_DEADLINE_SECS, DEFAULT_MAX_IN_FLIGHT, DEFAULT_ON_EXCEPTION_TIMEOUT_SECS,
    DEFAULT_RETRY_BACKOFF_MULTIPLIER, DEFAULT_RETRY_INITIAL_BACKOFF_SECS,
    DEFAULT_RETRY_MAX_ATTEMPTS, DEFAULT_RETRY_MAX_BACKOFF_SECS,
};
use crate::error::{AgentError, AgentResult};
use crate::retry::RetryPolicy;

pub const ENV_URI: &str = "HYBRID_AGENT_URI";
pub const ENV_API_KEY: &str = "HYBRID_AGENT_API_KEY";
pub const ENV_TENANT_ID: &str = "HYBRID_AGENT_TENANT_ID";
pub const ENV_AGENT_ID: &str = "HYBRID_AGENT_AGENT_ID";
pub const ENV_DEADLINE_SECS: &str = "HYBRID_AGENT_DEADLINE_SECS";
pub const ENV_RETRY_MAX_ATTEMPTS: &str = "HYBRID_AGENT_RETRY_MAX_ATTEMPTS";
pub const ENV_RETRY_INITIAL_BACKOFF_SECS: &str = "HYBRID_AGENT_RETRY_INITIAL_BACKOFF_SECS";
pub const ENV_RETRY_MAX_BACKOFF_SECS: &str = "HYBRID_AGENT_RETRY_MAX_BACKOFF_SECS";
pub const ENV_ON_EXCEPTION_TIMEOUT_SECS: &str = "HYBRID_AGENT_ON_EXCEPTION_TIMEOUT_SECS";
pub const ENV_MAX_IN_FLIGHT: &str = "HYBRID_AGENT_MAX_IN_FLIGHT";
pub const ENV_SEED_FILE: &str = "HYBRID_AGENT_SEED_FILE";

/// Runtime configuration of the agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Hub address, e.g. `https://hub.example.com:443`.
    pub hub_uri: String,

    /// Sent as `x-api-key` on every call.
    pub api_key: Option<String>,

    pub tenant_id: Option<String>,

    pub agent_id: Option<String>,

    /// Deadline applied to every hub call, including the request stream.
    /// The hub is expected to end the stream around this deadline; the agent
    /// then reconnects without delay.
    pub deadline: Duration,

    pub retry: RetryPolicy,

    /// Pause before reconnecting after an unexpected failure
    /// (default: 2 seconds).
    pub on_exception_delay: Duration,

    /// Maximum number of requests processed at once (default: 256).
    pub max_in_flight: usize,

    /// JSON document used to seed the in-memory PLM backend.
    pub seed_file: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            hub_uri: String::new(),
            api_key: None,
            tenant_id: None,
            agent_id: None,
            deadline: Duration::from_secs(DEFAULT_DEADLINE_SECS),
            retry: RetryPolicy::default(),
            on_exception_delay: Duration::from_secs_f64(DEFAULT_ON_EXCEPTION_TIMEOUT_SECS),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            seed_file: None,
        }
    }
}

impl AgentConfig {
    /// Load configuration from the process environment.
    ///
    /// # Environment Variables
    /// - `HYBRID_AGENT_URI`: Hub address (required)
    /// - `HYBRID_AGENT_API_KEY`: API key attached to every call
    /// - `HYBRID_AGENT_TENANT_ID`: Tenant id attached to every call
    /// - `HYBRID_AGENT_AGENT_ID`: Agent id attached to every call
    /// - `HYBRID_AGENT_DEADLINE_SECS`: Per-call deadline (default: 30)
    /// - `HYBRID_AGENT_RETRY_MAX_ATTEMPTS`: Attempts per call (default: 5)
    /// - `HYBRID_AGENT_RETRY_INITIAL_BACKOFF_SECS`: First backoff (default: 1.0)
    /// - `HYBRID_AGENT_RETRY_MAX_BACKOFF_SECS`: Backoff cap (default: 5.0)
    /// - `HYBRID_AGENT_ON_EXCEPTION_TIMEOUT_SECS`: Delay before reconnecting (default: 2.0)
    /// - `HYBRID_AGENT_MAX_IN_FLIGHT`: Concurrent requests (default: 256)
    /// - `HYBRID_AGENT_SEED_FILE`: Seed document for the in-memory backend
    pub fn from_env() -> AgentResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> AgentResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let hub_uri =
            text(ENV_URI).ok_or_else(|| AgentError::config(ENV_URI, "must be set"))?;

        let deadline = Duration::from_secs(parse(&lookup, ENV_DEADLINE_SECS, DEFAULT_DEADLINE_SECS)?);
        let retry = RetryPolicy {
            max_attempts: parse(&lookup, ENV_RETRY_MAX_ATTEMPTS, DEFAULT_RETRY_MAX_ATTEMPTS)?,
            initial_backoff: seconds(
                &lookup,
                ENV_RETRY_INITIAL_BACKOFF_SECS,
                DEFAULT_RETRY_INITIAL_BACKOFF_SECS,
            )?,
            max_backoff: seconds(
                &lookup,
                ENV_RETRY_MAX_BACKOFF_SECS,
                DEFAULT_RETRY_MAX_BACKOFF_SECS,
            )?,
            multiplier: DEFAULT_RETRY_BACKOFF_MULTIPLIER,
            jitter: true,
        };

        let config = Self {
            hub_uri,
            api_key: text(ENV_API_KEY),
            tenant_id: text(ENV_TENANT_ID),
            agent_id: text(ENV_AGENT_ID),
            deadline,
            retry,
            on_exception_delay: seconds(
                &lookup,
                ENV_ON_EXCEPTION_TIMEOUT_SECS,
                DEFAULT_ON_EXCEPTION_TIMEOUT_SECS,
            )?,
            max_in_flight: parse(&lookup, ENV_MAX_IN_FLIGHT, DEFAULT_MAX_IN_FLIGHT)?,
            seed_file: text(ENV_SEED_FILE).map(PathBuf::from),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges and the hub address.
    pub fn validate(&self) -> AgentResult<()> {
        if !(self.hub_uri.starts_with("http://") || self.hub_uri.starts_with("https://")) {
            return Err(AgentError::config(
                ENV_URI,
                format!("'{}' must start with http:// or https://", self.hub_uri),
            ));
        }
        if self.deadline.is_zero() {
            return Err(AgentError::config(ENV_DEADLINE_SECS, "must be greater than zero"));
        }
        if self.retry.max_attempts == 0 {
            return Err(AgentError::config(
                ENV_RETRY_MAX_ATTEMPTS,
                "must be at least 1",
            ));
        }
        if self.retry.max_backoff < self.retry.initial_backoff {
            return Err(AgentError::config(
                ENV_RETRY_MAX_BACKOFF_SECS,
                "must not be lower than the initial backoff",
            ));
        }
        if self.max_in_flight == 0 {
            return Err(AgentError::config(ENV_MAX_IN_FLIGHT, "must be at least 1"));
        }
        Ok(())
    }
}

fn parse<F, T>(lookup: &F, key: &str, default: T) -> AgentResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse()
            .map_err(|e: T::Err| AgentError::config(key, format!("'{raw}': {e}"))),
        None => Ok(default),
    }
}

fn seconds<F>(lookup: &F, key: &str, default: f64) -> AgentResult<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: f64 = parse(lookup, key, default)?;
    Duration::try_from_secs_f64(secs)
        .map_err(|_| AgentError::config(key, format!("'{secs}' is not a valid duration")))
}

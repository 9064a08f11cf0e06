//! Agent counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the receive loop and request processing.
///
/// Shared between the agent loop and the dispatcher through an `Arc`.
#[derive(Debug, Default)]
pub struct AgentMetrics {
    /// Request streams opened against the hub
    pub connects: AtomicU64,

    /// Requests received on any stream
    pub requests_received: AtomicU64,

    /// Requests with no operation populated
    pub routing_failures: AtomicU64,

    /// Units handed to a handler
    pub dispatched: AtomicU64,

    /// Handlers that returned an error
    pub dispatch_failures: AtomicU64,

    /// Handlers that panicked
    pub handler_panics: AtomicU64,

    /// Streams that ended on their deadline
    pub deadline_faults: AtomicU64,

    /// Streams that failed for any other reason
    pub unexpected_faults: AtomicU64,
}

impl AgentMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current snapshot of all counters.
    pub fn snapshot(&self) -> AgentMetricsSnapshot {
        AgentMetricsSnapshot {
            connects: self.connects.load(Ordering::Relaxed),
            requests_received: self.requests_received.load(Ordering::Relaxed),
            routing_failures: self.routing_failures.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            dispatch_failures: self.dispatch_failures.load(Ordering::Relaxed),
            handler_panics: self.handler_panics.load(Ordering::Relaxed),
            deadline_faults: self.deadline_faults.load(Ordering::Relaxed),
            unexpected_faults: self.unexpected_faults.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`AgentMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentMetricsSnapshot {
    pub connects: u64,
    pub requests_received: u64,
    pub routing_failures: u64,
    pub dispatched: u64,
    pub dispatch_failures: u64,
    pub handler_panics: u64,
    pub deadline_faults: u64,
    pub unexpected_faults: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_increments() {
        let metrics = AgentMetrics::new();
        AgentMetrics::incr(&metrics.connects);
        AgentMetrics::incr(&metrics.connects);
        AgentMetrics::incr(&metrics.handler_panics);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.connects, 2);
        assert_eq!(snapshot.handler_panics, 1);
        assert_eq!(snapshot.dispatched, 0);
    }
}

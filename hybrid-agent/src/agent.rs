//! Reverse agent receive loop.
//!
//! The agent keeps one request stream open against the hub. Every request is
//! handed to its own task so that a slow operation never holds up the next
//! read. When the stream ends or fails the agent reconnects:
//!
//! - deadline exceeded: reconnect immediately
//! - cancellation: stop once the run's token is cancelled
//! - anything else: wait `on_exception_delay`, then reconnect

use hybrid_core::{PlmMetadataService, PlmService};
use hybrid_proto::Request;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

use crate::config::AgentConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{AgentError, AgentResult};
use crate::handlers::HandlerContext;
use crate::hub::HubClient;
use crate::metrics::AgentMetrics;
use crate::router::route;

/// Receives requests from the hub and dispatches them.
pub struct ReverseAgent<H> {
    hub: Arc<H>,
    dispatcher: Arc<Dispatcher<H>>,
    metrics: Arc<AgentMetrics>,
    on_exception_delay: Duration,
    in_flight: Arc<Semaphore>,
    tasks: TaskTracker,
}

impl<H: HubClient> ReverseAgent<H> {
    pub fn new(
        hub: Arc<H>,
        service: Arc<dyn PlmService>,
        metadata: Arc<dyn PlmMetadataService>,
        config: &AgentConfig,
    ) -> Self {
        let metrics = Arc::new(AgentMetrics::new());
        let ctx = HandlerContext::new(service, metadata, Arc::clone(&hub));
        Self {
            hub,
            dispatcher: Arc::new(Dispatcher::new(ctx, Arc::clone(&metrics))),
            metrics,
            on_exception_delay: config.on_exception_delay,
            in_flight: Arc::new(Semaphore::new(config.max_in_flight)),
            tasks: TaskTracker::new(),
        }
    }

    pub fn metrics(&self) -> &Arc<AgentMetrics> {
        &self.metrics
    }

    /// Requests currently being processed.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Run until `token` is cancelled.
    ///
    /// Never fails: every fault is logged and followed by a reconnect.
    /// Requests still in flight when the loop exits are not awaited.
    pub async fn run(&self, token: CancellationToken) {
        info!("Reverse agent started");

        while !token.is_cancelled() {
            match self.run_session(&token).await {
                Ok(()) => debug!("Hub closed the request stream, reconnecting"),
                Err(err) if err.is_deadline_exceeded() => {
                    AgentMetrics::incr(&self.metrics.deadline_faults);
                    debug!(error = %err, "Deadline Exceeded");
                }
                Err(err) if err.is_cancellation() => {
                    info!(error = %err, "Cancellation request received");
                }
                Err(err) => {
                    AgentMetrics::incr(&self.metrics.unexpected_faults);
                    error!(
                        error = %err,
                        delay = ?self.on_exception_delay,
                        "Unexpected error occurred"
                    );
                    tokio::select! {
                        _ = token.cancelled() => {}
                        _ = tokio::time::sleep(self.on_exception_delay) => {}
                    }
                }
            }
        }

        info!("Reverse agent stopped");
    }

    /// One connection: open the stream and read it until it ends.
    async fn run_session(&self, token: &CancellationToken) -> AgentResult<()> {
        AgentMetrics::incr(&self.metrics.connects);
        let mut requests = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(AgentError::Cancelled),
            opened = self.hub.fetch_requests() => opened?,
        };
        debug!("Connected to hub");

        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(AgentError::Cancelled),
                next = requests.next() => next,
            };
            match next {
                Some(Ok(request)) => self.accept(request, token).await?,
                Some(Err(status)) => return Err(status.into()),
                None => return Ok(()),
            }
        }
    }

    /// Hand one request to its own task.
    async fn accept(&self, request: Request, token: &CancellationToken) -> AgentResult<()> {
        AgentMetrics::incr(&self.metrics.requests_received);
        info!(correlation_id = %request.correlation_id, "Received request");

        let permit = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(AgentError::Cancelled),
            permit = Arc::clone(&self.in_flight).acquire_owned() => {
                permit.map_err(|_| AgentError::Cancelled)?
            }
        };

        let dispatcher = Arc::clone(&self.dispatcher);
        let metrics = Arc::clone(&self.metrics);
        let token = token.clone();
        self.tasks.spawn(async move {
            let _permit = permit;
            match route(request) {
                Ok(unit) => dispatcher.publish(unit, &token).await,
                Err(err) => {
                    AgentMetrics::incr(&metrics.routing_failures);
                    error!(error = %err, "Unexpected mediator error occurred");
                }
            }
        });
        Ok(())
    }
}

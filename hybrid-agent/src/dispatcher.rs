//! Dispatch of routed units of work to their handlers.

use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::AgentResult;
use crate::handlers::{
    advance_state, create_items, create_relationships, delete_items, is_operation_supported,
    query_items, read_items, read_relationships, read_type_identifiers, read_types, test_access,
    update_items, upload_file, HandlerContext,
};
use crate::hub::HubClient;
use crate::metrics::AgentMetrics;
use crate::router::{Payload, UnitOfWork};

/// Sends each unit of work to the handler for its operation.
///
/// Failures stop here: errors and panics are logged with the correlation id
/// and counted, never returned to the caller.
pub struct Dispatcher<H> {
    ctx: HandlerContext<H>,
    metrics: Arc<AgentMetrics>,
}

impl<H: HubClient> Dispatcher<H> {
    pub fn new(ctx: HandlerContext<H>, metrics: Arc<AgentMetrics>) -> Self {
        Self { ctx, metrics }
    }

    /// Run the handler for `unit` to completion.
    pub async fn publish(&self, unit: UnitOfWork, token: &CancellationToken) {
        let correlation_id = unit.correlation_id.clone();
        let operation = unit.kind();
        AgentMetrics::incr(&self.metrics.dispatched);

        match AssertUnwindSafe(self.dispatch(unit, token)).catch_unwind().await {
            Ok(Ok(())) => {
                debug!(correlation_id = %correlation_id, %operation, "Request handled");
            }
            Ok(Err(err)) if err.is_cancellation() => {
                info!(correlation_id = %correlation_id, %operation, "Request cancelled");
            }
            Ok(Err(err)) => {
                AgentMetrics::incr(&self.metrics.dispatch_failures);
                error!(
                    correlation_id = %correlation_id,
                    %operation,
                    error = %err,
                    "Failed to handle request"
                );
            }
            Err(panic) => {
                AgentMetrics::incr(&self.metrics.handler_panics);
                error!(
                    correlation_id = %correlation_id,
                    %operation,
                    panic = panic_message(panic.as_ref()),
                    "Request handler panicked"
                );
            }
        }
    }

    async fn dispatch(&self, unit: UnitOfWork, token: &CancellationToken) -> AgentResult<()> {
        let ctx = &self.ctx;
        let id = unit.correlation_id.as_str();
        match unit.payload {
            Payload::TestAccess(p) => test_access::handle(ctx, id, p, token).await,
            Payload::AdvanceState(p) => advance_state::handle(ctx, id, p, token).await,
            Payload::IsOperationSupported(p) => {
                is_operation_supported::handle(ctx, id, p, token).await
            }
            Payload::CreateRelationships(p) => {
                create_relationships::handle(ctx, id, p, token).await
            }
            Payload::ReadRelationships(p) => read_relationships::handle(ctx, id, p, token).await,
            Payload::UploadFile(p) => upload_file::handle(ctx, id, p, token).await,
            Payload::CreateItems(p) => create_items::handle(ctx, id, p, token).await,
            Payload::DeleteItems(p) => delete_items::handle(ctx, id, p, token).await,
            Payload::QueryItems(p) => query_items::handle(ctx, id, p, token).await,
            Payload::ReadItems(p) => read_items::handle(ctx, id, p, token).await,
            Payload::UpdateItems(p) => update_items::handle(ctx, id, p, token).await,
            Payload::ReadTypes(p) => read_types::handle(ctx, id, p, token).await,
            Payload::ReadTypeIdentifiers(p) => {
                read_type_identifiers::handle(ctx, id, p, token).await
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

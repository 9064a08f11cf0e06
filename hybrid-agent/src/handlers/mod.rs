//! Operation handlers.
//!
//! One module per operation. Each handler converts the wire payload, calls
//! the PLM service, converts the result, and replies to the hub under the
//! request's correlation id. Unary operations reply with one `send`;
//! list-shaped operations open a reply stream before calling the service and
//! always complete it.

pub(crate) mod advance_state;
pub(crate) mod create_items;
pub(crate) mod create_relationships;
pub(crate) mod delete_items;
pub(crate) mod is_operation_supported;
pub(crate) mod query_items;
pub(crate) mod read_items;
pub(crate) mod read_relationships;
pub(crate) mod read_type_identifiers;
pub(crate) mod read_types;
pub(crate) mod test_access;
pub(crate) mod update_items;
pub(crate) mod upload_file;

use hybrid_core::{ItemResult, PlmError, PlmMetadataService, PlmResult, PlmService};
use hybrid_proto::reverse::ItemResultEx;
use hybrid_proto::{Envelope, UnaryMethod};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{AgentError, AgentResult};
use crate::hub::{HubClient, ReplyStream};

/// Everything a handler needs besides its payload.
pub struct HandlerContext<H> {
    pub service: Arc<dyn PlmService>,
    pub metadata: Arc<dyn PlmMetadataService>,
    pub hub: Arc<H>,
}

impl<H> Clone for HandlerContext<H> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            metadata: Arc::clone(&self.metadata),
            hub: Arc::clone(&self.hub),
        }
    }
}

impl<H: HubClient> HandlerContext<H> {
    pub fn new(
        service: Arc<dyn PlmService>,
        metadata: Arc<dyn PlmMetadataService>,
        hub: Arc<H>,
    ) -> Self {
        Self {
            service,
            metadata,
            hub,
        }
    }
}

/// Await a service call unless the request is cancelled first.
pub(crate) async fn call_service<T, F>(token: &CancellationToken, call: F) -> AgentResult<T>
where
    F: Future<Output = PlmResult<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(AgentError::Cancelled),
        result = call => result.map_err(AgentError::from),
    }
}

/// Send a unary reply unless the request is cancelled first.
///
/// Cancellation drops the in-flight call along with any retry backoff.
pub(crate) async fn send_reply<H, M>(
    ctx: &HandlerContext<H>,
    token: &CancellationToken,
    method: UnaryMethod<M>,
    correlation_id: &str,
    value: M::Value,
) -> AgentResult<()>
where
    H: HubClient,
    M: Envelope,
{
    let message = M::wrap(correlation_id, value);
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(AgentError::Cancelled),
        sent = ctx.hub.send(method, correlation_id, message) => sent.map_err(AgentError::from),
    }
}

/// Write one message per value, tagged with the stream's correlation id.
pub(crate) async fn write_all<M, I>(stream: &mut ReplyStream<M>, values: I) -> AgentResult<()>
where
    M: Envelope,
    I: IntoIterator,
    I::Item: Into<M::Value>,
{
    for value in values {
        let message = M::wrap(stream.correlation_id(), value.into());
        stream.write(message).await?;
    }
    Ok(())
}

/// Complete `stream`; an earlier failure takes precedence over a failed
/// completion.
pub(crate) async fn finish<M: Envelope>(
    stream: ReplyStream<M>,
    outcome: AgentResult<()>,
) -> AgentResult<()> {
    let completed = stream.complete().await;
    outcome.and(completed)
}

/// Make a batch result list line up with its `expected` inputs.
///
/// Missing positions become error entries; surplus entries are dropped.
pub(crate) fn align_results(
    correlation_id: &str,
    operation: &'static str,
    expected: usize,
    mut results: Vec<ItemResult>,
) -> Vec<ItemResult> {
    if results.len() > expected {
        warn!(
            correlation_id,
            operation,
            expected,
            returned = results.len(),
            "Service returned more results than inputs, dropping surplus"
        );
        results.truncate(expected);
    }
    while results.len() < expected {
        let position = results.len();
        results.push(ItemResult::error(format!(
            "No result returned for item at position {position}"
        )));
    }
    results
}

/// Reply to a create or update batch.
///
/// A failed service call becomes a single error entry carrying the failure
/// message; the handler still succeeds. Cancellation is returned as is.
pub(crate) async fn reply_batch(
    mut stream: ReplyStream<ItemResultEx>,
    operation: &'static str,
    expected: usize,
    outcome: AgentResult<Vec<ItemResult>>,
) -> AgentResult<()> {
    let correlation_id = stream.correlation_id().to_string();
    let results = match outcome {
        Ok(results) => align_results(&correlation_id, operation, expected, results),
        Err(AgentError::Service(err)) if !matches!(err, PlmError::Cancelled) => {
            warn!(
                correlation_id = %correlation_id,
                operation,
                error = %err,
                "Batch failed, replying with a single error result"
            );
            vec![ItemResult::error(err.to_string())]
        }
        Err(err) => return finish(stream, Err(err)).await,
    };

    let written = write_all(&mut stream, results).await;
    finish(stream, written).await
}

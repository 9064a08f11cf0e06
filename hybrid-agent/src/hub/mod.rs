//! Hub client abstraction.
//!
//! The agent only talks to the hub through [`HubClient`]: one long-lived
//! server stream that delivers requests, unary replies, and client-streaming
//! replies. [`GrpcHubClient`] is the production implementation.

mod grpc;

pub use grpc::GrpcHubClient;

use async_trait::async_trait;
use hybrid_proto::{Envelope, Request, StreamingMethod, UnaryMethod};
use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;
use tonic::Status;
use tracing::debug;

use crate::constants::REPLY_STREAM_BUFFER;
use crate::error::{AgentError, AgentResult};

/// Requests delivered by the hub on one `GetRequest` call.
pub type InboundStream = Pin<Box<dyn Stream<Item = Result<Request, Status>> + Send>>;

/// Outbound side of the agent's connection to the hub.
#[async_trait]
pub trait HubClient: Send + Sync + 'static {
    /// Open the request stream. The stream ends when the hub closes it or its
    /// deadline passes.
    async fn fetch_requests(&self) -> Result<InboundStream, Status>;

    /// Send one unary reply tagged with `correlation_id`.
    ///
    /// Dropping the returned future abandons the call, including any retry
    /// backoff in progress.
    async fn send<M: Envelope>(
        &self,
        method: UnaryMethod<M>,
        correlation_id: &str,
        message: M,
    ) -> Result<(), Status>;

    /// Start a client-streaming reply tagged with `correlation_id`. Writes
    /// and completion stop waiting on the hub once `token` is cancelled.
    fn open_stream<M: Envelope>(
        &self,
        method: StreamingMethod<M>,
        correlation_id: &str,
        token: &CancellationToken,
    ) -> ReplyStream<M>;
}

/// Writer half of a client-streaming reply.
///
/// Messages are forwarded to a background task that owns the call. The
/// stream is closed by [`ReplyStream::complete`], or by dropping the writer
/// on any other exit path. After cancellation the call is left to finish on
/// its own, bounded by its deadline.
pub struct ReplyStream<M> {
    method: &'static str,
    correlation_id: String,
    token: CancellationToken,
    sender: Option<mpsc::Sender<M>>,
    call: Option<JoinHandle<Result<(), Status>>>,
}

impl<M: Envelope> ReplyStream<M> {
    /// Spawn `call` with the receiving end of the reply channel.
    pub fn spawn<F, Fut>(
        method: StreamingMethod<M>,
        correlation_id: &str,
        token: &CancellationToken,
        call: F,
    ) -> Self
    where
        F: FnOnce(ReceiverStream<M>) -> Fut,
        Fut: Future<Output = Result<(), Status>> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(REPLY_STREAM_BUFFER);
        let call = tokio::spawn(call(ReceiverStream::new(receiver)));
        Self {
            method: method.name(),
            correlation_id: correlation_id.to_string(),
            token: token.clone(),
            sender: Some(sender),
            call: Some(call),
        }
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Queue one message on the stream.
    pub async fn write(&mut self, message: M) -> AgentResult<()> {
        let Some(sender) = self.sender.as_ref() else {
            return Err(AgentError::ReplyStreamClosed {
                method: self.method,
            });
        };
        let delivered = tokio::select! {
            biased;
            _ = self.token.cancelled() => return Err(AgentError::Cancelled),
            sent = sender.send(message) => sent.is_ok(),
        };
        if delivered {
            return Ok(());
        }

        // The call ended early; report its status if it has one.
        self.sender = None;
        match self.call.take() {
            Some(call) => match Self::join(self.method, call).await {
                Err(err) => Err(err),
                Ok(()) => Err(AgentError::ReplyStreamClosed {
                    method: self.method,
                }),
            },
            None => Err(AgentError::ReplyStreamClosed {
                method: self.method,
            }),
        }
    }

    /// Close the stream and wait for the hub to acknowledge it, or for
    /// cancellation.
    pub async fn complete(mut self) -> AgentResult<()> {
        self.sender = None;
        let Some(call) = self.call.take() else {
            return Ok(());
        };
        tokio::select! {
            biased;
            joined = Self::join(self.method, call) => joined,
            _ = self.token.cancelled() => {
                debug!(
                    method = self.method,
                    correlation_id = %self.correlation_id,
                    "Reply stream closed without waiting for acknowledgement"
                );
                Err(AgentError::Cancelled)
            }
        }
    }

    async fn join(method: &'static str, call: JoinHandle<Result<(), Status>>) -> AgentResult<()> {
        match call.await {
            Ok(result) => result.map_err(AgentError::from),
            Err(e) => Err(AgentError::ReplyTask {
                method,
                reason: e.to_string(),
            }),
        }
    }
}

impl<M> Drop for ReplyStream<M> {
    fn drop(&mut self) {
        if self.call.is_some() {
            debug!(
                method = self.method,
                correlation_id = %self.correlation_id,
                "Reply stream dropped before completion, closing"
            );
        }
    }
}

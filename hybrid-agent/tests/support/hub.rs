#![allow(dead_code)]

use async_trait::async_trait;
use hybrid_agent::{HubClient, InboundStream, ReplyStream};
use hybrid_proto::{Envelope, Request, StreamingMethod, UnaryMethod};
use prost::Message;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::Instant;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tonic::Status;

/// What one `fetch_requests` call does.
pub enum Session {
    /// Opening the stream fails.
    Fail(Status),
    /// Yields these items, then the hub closes the stream.
    Deliver(Vec<Result<Request, Status>>),
    /// Yields these requests, then stays open.
    DeliverAndHold(Vec<Request>),
}

#[derive(Debug, Clone)]
pub struct SentReply {
    pub method: &'static str,
    pub correlation_id: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct RecordedStream {
    pub method: &'static str,
    pub correlation_id: String,
    pub messages: Vec<Vec<u8>>,
    pub completions: usize,
}

/// In-process hub that replays scripted sessions and records every reply.
///
/// Once the scripted sessions are used up, `fetch_requests` cancels the
/// `on_exhausted` token (if any) and returns a stream that never yields.
#[derive(Default)]
pub struct MockHub {
    sessions: Mutex<VecDeque<Session>>,
    on_exhausted: Option<CancellationToken>,
    fetch_times: Mutex<Vec<Instant>>,
    open_streams: Arc<AtomicUsize>,
    sent: Mutex<Vec<SentReply>>,
    streams: Arc<Mutex<Vec<RecordedStream>>>,
    send_failure: Option<Status>,
    send_attempts: AtomicUsize,
    hang_sends: bool,
    hang_stream_acks: bool,
}

impl MockHub {
    pub fn new(sessions: Vec<Session>) -> Self {
        Self {
            sessions: Mutex::new(sessions.into()),
            ..Self::default()
        }
    }

    pub fn cancel_when_exhausted(mut self, token: CancellationToken) -> Self {
        self.on_exhausted = Some(token);
        self
    }

    pub fn failing_sends(mut self, status: Status) -> Self {
        self.send_failure = Some(status);
        self
    }

    /// Unary sends never return.
    pub fn hanging_sends(mut self) -> Self {
        self.hang_sends = true;
        self
    }

    /// Reply streams are drained but never acknowledged.
    pub fn hanging_stream_acks(mut self) -> Self {
        self.hang_stream_acks = true;
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_times.lock().unwrap().len()
    }

    pub fn fetch_times(&self) -> Vec<Instant> {
        self.fetch_times.lock().unwrap().clone()
    }

    /// Request streams currently held by the agent.
    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<SentReply> {
        self.sent.lock().unwrap().clone()
    }

    /// Decoded unary replies sent on `method`.
    pub fn sent_on<M: Envelope>(&self, method: UnaryMethod<M>) -> Vec<M> {
        self.sent()
            .into_iter()
            .filter(|reply| reply.method == method.name())
            .map(|reply| M::decode(reply.bytes.as_slice()).unwrap())
            .collect()
    }

    pub fn streams(&self) -> Vec<RecordedStream> {
        self.streams.lock().unwrap().clone()
    }

    /// Decoded messages of the single stream opened on `method`.
    pub fn stream_on<M: Envelope>(&self, method: StreamingMethod<M>) -> (Vec<M>, usize) {
        let streams: Vec<_> = self
            .streams()
            .into_iter()
            .filter(|stream| stream.method == method.name())
            .collect();
        assert_eq!(streams.len(), 1, "expected one {} stream", method.name());
        let stream = &streams[0];
        let messages = stream
            .messages
            .iter()
            .map(|bytes| M::decode(bytes.as_slice()).unwrap())
            .collect();
        (messages, stream.completions)
    }

    /// Wait until `count` reply streams have been completed.
    pub async fn wait_for_completed_streams(&self, count: usize) {
        loop {
            let completed = self
                .streams
                .lock()
                .unwrap()
                .iter()
                .filter(|stream| stream.completions > 0)
                .count();
            if completed >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    pub async fn wait_for_sends(&self, count: usize) {
        while self.sent.lock().unwrap().len() < count {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    /// Wait until `count` unary sends have started, whether or not they return.
    pub async fn wait_for_send_attempts(&self, count: usize) {
        while self.send_attempts.load(Ordering::SeqCst) < count {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    pub async fn wait_for_fetches(&self, count: usize) {
        while self.fetch_count() < count {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    fn track(&self, inner: InboundStream) -> InboundStream {
        self.open_streams.fetch_add(1, Ordering::SeqCst);
        Box::pin(TrackedStream {
            inner,
            open: Arc::clone(&self.open_streams),
        })
    }
}

#[async_trait]
impl HubClient for MockHub {
    async fn fetch_requests(&self) -> Result<InboundStream, Status> {
        self.fetch_times.lock().unwrap().push(Instant::now());
        let session = self.sessions.lock().unwrap().pop_front();
        match session {
            Some(Session::Fail(status)) => Err(status),
            Some(Session::Deliver(items)) => Ok(self.track(Box::pin(tokio_stream::iter(items)))),
            Some(Session::DeliverAndHold(requests)) => {
                let items = tokio_stream::iter(requests.into_iter().map(Ok));
                Ok(self.track(Box::pin(items.chain(tokio_stream::pending()))))
            }
            None => {
                if let Some(token) = &self.on_exhausted {
                    token.cancel();
                }
                Ok(self.track(Box::pin(tokio_stream::pending::<Result<Request, Status>>())))
            }
        }
    }

    async fn send<M: Envelope>(
        &self,
        method: UnaryMethod<M>,
        correlation_id: &str,
        message: M,
    ) -> Result<(), Status> {
        self.send_attempts.fetch_add(1, Ordering::SeqCst);
        if self.hang_sends {
            std::future::pending::<()>().await;
        }
        if let Some(status) = &self.send_failure {
            return Err(status.clone());
        }
        self.sent.lock().unwrap().push(SentReply {
            method: method.name(),
            correlation_id: correlation_id.to_string(),
            bytes: message.encode_to_vec(),
        });
        Ok(())
    }

    fn open_stream<M: Envelope>(
        &self,
        method: StreamingMethod<M>,
        correlation_id: &str,
        token: &CancellationToken,
    ) -> ReplyStream<M> {
        let hang = self.hang_stream_acks;
        let streams = Arc::clone(&self.streams);
        let index = {
            let mut all = streams.lock().unwrap();
            all.push(RecordedStream {
                method: method.name(),
                correlation_id: correlation_id.to_string(),
                ..Default::default()
            });
            all.len() - 1
        };
        ReplyStream::spawn(method, correlation_id, token, move |mut messages| async move {
            while let Some(message) = messages.next().await {
                streams.lock().unwrap()[index]
                    .messages
                    .push(message.encode_to_vec());
            }
            streams.lock().unwrap()[index].completions += 1;
            if hang {
                std::future::pending::<()>().await;
            }
            Ok(())
        })
    }
}

struct TrackedStream {
    inner: InboundStream,
    open: Arc<AtomicUsize>,
}

impl Stream for TrackedStream {
    type Item = Result<Request, Status>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.as_mut().poll_next(cx)
    }
}

impl Drop for TrackedStream {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

//! tonic implementation of [`HubClient`].

use async_trait::async_trait;
use hybrid_proto::custom::Void;
use hybrid_proto::methods::HubServiceClient;
use hybrid_proto::{Envelope, StreamingMethod, UnaryMethod, CORRELATION_ID_KEY};
use std::time::Duration;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tonic::Status;
use tracing::{debug, info};

use super::{HubClient, InboundStream, ReplyStream};
use crate::config::{AgentConfig, ENV_AGENT_ID, ENV_API_KEY, ENV_TENANT_ID};
use crate::constants::{AGENT_ID_HEADER, API_KEY_HEADER, TENANT_ID_HEADER};
use crate::error::{AgentError, AgentResult};
use crate::retry::RetryPolicy;

/// Hub client over a lazily connected gRPC channel.
///
/// Cloning is cheap; clones share the underlying connection.
#[derive(Clone)]
pub struct GrpcHubClient {
    channel: Channel,
    headers: Vec<(&'static str, MetadataValue<Ascii>)>,
    deadline: Duration,
    retry: RetryPolicy,
}

impl GrpcHubClient {
    /// Build a client from the agent configuration. No connection is made
    /// until the first call.
    pub fn new(config: &AgentConfig) -> AgentResult<Self> {
        let mut endpoint = Endpoint::from_shared(config.hub_uri.clone())?
            .connect_timeout(config.deadline)
            .tcp_keepalive(Some(Duration::from_secs(30)));
        if config.hub_uri.starts_with("https://") {
            endpoint = endpoint.tls_config(ClientTlsConfig::new().with_webpki_roots())?;
        }

        let mut headers = Vec::new();
        for (header, field, value) in [
            (API_KEY_HEADER, ENV_API_KEY, &config.api_key),
            (TENANT_ID_HEADER, ENV_TENANT_ID, &config.tenant_id),
            (AGENT_ID_HEADER, ENV_AGENT_ID, &config.agent_id),
        ] {
            if let Some(value) = value {
                let value = value
                    .parse::<MetadataValue<Ascii>>()
                    .map_err(|e| AgentError::config(field, e.to_string()))?;
                headers.push((header, value));
            }
        }

        info!(hub_uri = %config.hub_uri, deadline = ?config.deadline, "Hub client configured");

        Ok(Self {
            channel: endpoint.connect_lazy(),
            headers,
            deadline: config.deadline,
            retry: config.retry.clone(),
        })
    }

    fn request<T>(&self, message: T, correlation_id: Option<&str>) -> Result<tonic::Request<T>, Status> {
        let mut request = tonic::Request::new(message);
        request.set_timeout(self.deadline);
        let metadata = request.metadata_mut();
        for (key, value) in &self.headers {
            metadata.insert(*key, value.clone());
        }
        if let Some(correlation_id) = correlation_id {
            let value = correlation_id
                .parse::<MetadataValue<Ascii>>()
                .map_err(|_| Status::invalid_argument("correlation id is not valid metadata"))?;
            metadata.insert(CORRELATION_ID_KEY, value);
        }
        Ok(request)
    }

    fn client(&self) -> HubServiceClient {
        HubServiceClient::new(self.channel.clone())
    }
}

#[async_trait]
impl HubClient for GrpcHubClient {
    async fn fetch_requests(&self) -> Result<InboundStream, Status> {
        let stream = self
            .retry
            .run("GetRequest", || async {
                let request = self.request(Void {}, None)?;
                let mut client = self.client();
                client.get_request(request).await
            })
            .await?
            .into_inner();

        debug!("Request stream opened");
        Ok(Box::pin(stream))
    }

    async fn send<M: Envelope>(
        &self,
        method: UnaryMethod<M>,
        correlation_id: &str,
        message: M,
    ) -> Result<(), Status> {
        self.retry
            .run(method.name(), || {
                let message = message.clone();
                async move {
                    let request = self.request(message, Some(correlation_id))?;
                    let mut client = self.client();
                    method.call(&mut client, request).await
                }
            })
            .await?;
        Ok(())
    }

    fn open_stream<M: Envelope>(
        &self,
        method: StreamingMethod<M>,
        correlation_id: &str,
        token: &CancellationToken,
    ) -> ReplyStream<M> {
        let hub = self.clone();
        let tag = correlation_id.to_string();
        ReplyStream::spawn(method, correlation_id, token, move |messages: ReceiverStream<M>| async move {
            let request = hub.request(messages, Some(&tag))?;
            let mut client = hub.client();
            method.call(&mut client, request).await?;
            Ok(())
        })
    }
}

//! Typed descriptors for the calls the agent makes on the hub.
//!
//! Several reply calls share a message type (`VoidEx`, `ItemResultEx`), so a
//! descriptor pairs the call's path with the generated client method that
//! performs it.

use crate::custom::Void;
use crate::reverse::reverse_plm_service_client::ReversePlmServiceClient;
use crate::reverse::{
    AuthResultEx, FileResourceResponseEx, IdEx, ItemEx, ItemResultEx,
    OperationSupportedResponseEx, RelationshipTableEx, TypeEx, TypeIdEx, VoidEx,
};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::Channel;
use tonic::{Response, Status};

/// Fully-qualified name of the hub service.
pub const SERVICE_NAME: &str = "altium.plm.custom.reverse.ReversePLMService";

/// Server-streaming call that yields inbound requests.
pub const GET_REQUEST_PATH: &str = "/altium.plm.custom.reverse.ReversePLMService/GetRequest";

/// Generated hub client over a tonic channel.
pub type HubServiceClient = ReversePlmServiceClient<Channel>;

/// An in-progress reply call, borrowing the client that issued it.
pub type ReplyCall<'a> = Pin<Box<dyn Future<Output = Result<Response<Void>, Status>> + Send + 'a>>;

type UnaryFn<M> = for<'a> fn(&'a mut HubServiceClient, tonic::Request<M>) -> ReplyCall<'a>;

type StreamingFn<M> =
    for<'a> fn(&'a mut HubServiceClient, tonic::Request<ReceiverStream<M>>) -> ReplyCall<'a>;

fn method_name(path: &'static str) -> &'static str {
    path.rsplit('/').next().unwrap_or(path)
}

/// A unary reply call whose request message type is `M`.
pub struct UnaryMethod<M> {
    path: &'static str,
    call: UnaryFn<M>,
}

impl<M> UnaryMethod<M> {
    pub const fn new(path: &'static str, call: UnaryFn<M>) -> Self {
        Self { path, call }
    }

    /// gRPC path, `/package.Service/Method`.
    pub fn path(&self) -> &'static str {
        self.path
    }

    /// Bare method name, e.g. `ReturnTestAccess`.
    pub fn name(&self) -> &'static str {
        method_name(self.path)
    }

    /// Issue the call on `client`.
    pub fn call<'a>(&self, client: &'a mut HubServiceClient, request: tonic::Request<M>) -> ReplyCall<'a> {
        (self.call)(client, request)
    }
}

impl<M> Clone for UnaryMethod<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for UnaryMethod<M> {}

impl<M> fmt::Debug for UnaryMethod<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UnaryMethod").field(&self.path).finish()
    }
}

/// A client-streaming reply call whose stream carries `M`.
pub struct StreamingMethod<M> {
    path: &'static str,
    call: StreamingFn<M>,
}

impl<M> StreamingMethod<M> {
    pub const fn new(path: &'static str, call: StreamingFn<M>) -> Self {
        Self { path, call }
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    /// Bare method name, e.g. `ReturnCreateItems`.
    pub fn name(&self) -> &'static str {
        method_name(self.path)
    }

    /// Issue the call on `client`; it ends once `request`'s stream does.
    pub fn call<'a>(
        &self,
        client: &'a mut HubServiceClient,
        request: tonic::Request<ReceiverStream<M>>,
    ) -> ReplyCall<'a> {
        (self.call)(client, request)
    }
}

impl<M> Clone for StreamingMethod<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for StreamingMethod<M> {}

impl<M> fmt::Debug for StreamingMethod<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StreamingMethod").field(&self.path).finish()
    }
}

// ============================================================================
// UNARY REPLIES
// ============================================================================

pub const RETURN_TEST_ACCESS: UnaryMethod<AuthResultEx> = UnaryMethod::new(
    "/altium.plm.custom.reverse.ReversePLMService/ReturnTestAccess",
    |client, request| Box::pin(client.return_test_access(request)),
);
pub const RETURN_ADVANCE_STATE: UnaryMethod<VoidEx> = UnaryMethod::new(
    "/altium.plm.custom.reverse.ReversePLMService/ReturnAdvanceState",
    |client, request| Box::pin(client.return_advance_state(request)),
);
pub const RETURN_IS_OPERATION_SUPPORTED: UnaryMethod<OperationSupportedResponseEx> = UnaryMethod::new(
    "/altium.plm.custom.reverse.ReversePLMService/ReturnIsOperationSupported",
    |client, request| Box::pin(client.return_is_operation_supported(request)),
);
pub const RETURN_CREATE_RELATIONSHIPS: UnaryMethod<VoidEx> = UnaryMethod::new(
    "/altium.plm.custom.reverse.ReversePLMService/ReturnCreateRelationships",
    |client, request| Box::pin(client.return_create_relationships(request)),
);
pub const RETURN_DELETE_ITEMS: UnaryMethod<VoidEx> = UnaryMethod::new(
    "/altium.plm.custom.reverse.ReversePLMService/ReturnDeleteItems",
    |client, request| Box::pin(client.return_delete_items(request)),
);
pub const RETURN_UPLOAD_FILE: UnaryMethod<FileResourceResponseEx> = UnaryMethod::new(
    "/altium.plm.custom.reverse.ReversePLMService/ReturnUploadFile",
    |client, request| Box::pin(client.return_upload_file(request)),
);

// ============================================================================
// CLIENT-STREAMING REPLIES
// ============================================================================

pub const RETURN_CREATE_ITEMS: StreamingMethod<ItemResultEx> = StreamingMethod::new(
    "/altium.plm.custom.reverse.ReversePLMService/ReturnCreateItems",
    |client, request| Box::pin(client.return_create_items(request)),
);
pub const RETURN_UPDATE_ITEMS: StreamingMethod<ItemResultEx> = StreamingMethod::new(
    "/altium.plm.custom.reverse.ReversePLMService/ReturnUpdateItems",
    |client, request| Box::pin(client.return_update_items(request)),
);
pub const RETURN_READ_ITEMS: StreamingMethod<ItemEx> = StreamingMethod::new(
    "/altium.plm.custom.reverse.ReversePLMService/ReturnReadItems",
    |client, request| Box::pin(client.return_read_items(request)),
);
pub const RETURN_QUERY_ITEMS: StreamingMethod<IdEx> = StreamingMethod::new(
    "/altium.plm.custom.reverse.ReversePLMService/ReturnQueryItems",
    |client, request| Box::pin(client.return_query_items(request)),
);
pub const RETURN_READ_RELATIONSHIPS: StreamingMethod<RelationshipTableEx> = StreamingMethod::new(
    "/altium.plm.custom.reverse.ReversePLMService/ReturnReadRelationships",
    |client, request| Box::pin(client.return_read_relationships(request)),
);
pub const RETURN_READ_TYPES: StreamingMethod<TypeEx> = StreamingMethod::new(
    "/altium.plm.custom.reverse.ReversePLMService/ReturnReadTypes",
    |client, request| Box::pin(client.return_read_types(request)),
);
pub const RETURN_READ_TYPE_IDENTIFIERS: StreamingMethod<TypeIdEx> = StreamingMethod::new(
    "/altium.plm.custom.reverse.ReversePLMService/ReturnReadTypeIdentifiers",
    |client, request| Box::pin(client.return_read_type_identifiers(request)),
);

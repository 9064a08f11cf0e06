//! Read full type definitions from the metadata service.

use hybrid_core::TypeId;
use hybrid_proto::custom;
use hybrid_proto::methods::RETURN_READ_TYPES;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{call_service, finish, write_all, HandlerContext};
use crate::error::AgentResult;
use crate::hub::HubClient;

pub(crate) async fn handle<H: HubClient>(
    ctx: &HandlerContext<H>,
    correlation_id: &str,
    payload: custom::TypeIdRequest,
    token: &CancellationToken,
) -> AgentResult<()> {
    info!(correlation_id, count = payload.data.len(), "Handling ReadTypes request");

    let mut stream = ctx.hub.open_stream(RETURN_READ_TYPES, correlation_id, token);
    let type_ids = payload.data.into_iter().map(TypeId::from).collect();
    let outcome: AgentResult<()> = async {
        let types = call_service(token, ctx.metadata.read_types(type_ids, token)).await?;
        write_all(&mut stream, types).await
    }
    .await;

    finish(stream, outcome).await
}

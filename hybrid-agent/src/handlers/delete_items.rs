use hybrid_core::Id;
use hybrid_proto::custom;
use hybrid_proto::methods::RETURN_DELETE_ITEMS;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{call_service, send_reply, HandlerContext};
use crate::error::AgentResult;
use crate::hub::HubClient;

pub(crate) async fn handle<H: HubClient>(
    ctx: &HandlerContext<H>,
    correlation_id: &str,
    payload: custom::IdRequest,
    token: &CancellationToken,
) -> AgentResult<()> {
    info!(correlation_id, count = payload.data.len(), "Handling DeleteItems request");

    let ids = payload.data.into_iter().map(Id::from).collect();
    call_service(token, ctx.service.delete_items(ids, token)).await?;

    send_reply(ctx, token, RETURN_DELETE_ITEMS, correlation_id, custom::Void {}).await
}

use hybrid_core::ItemUpdateSpec;
use hybrid_proto::custom;
use hybrid_proto::methods::RETURN_UPDATE_ITEMS;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{call_service, reply_batch, HandlerContext};
use crate::error::AgentResult;
use crate::hub::HubClient;

pub(crate) async fn handle<H: HubClient>(
    ctx: &HandlerContext<H>,
    correlation_id: &str,
    payload: custom::ItemUpdateRequest,
    token: &CancellationToken,
) -> AgentResult<()> {
    let expected = payload.data.len();
    info!(correlation_id, count = expected, "Handling UpdateItems request");

    let stream = ctx.hub.open_stream(RETURN_UPDATE_ITEMS, correlation_id, token);
    let specs = payload.data.into_iter().map(ItemUpdateSpec::from).collect();
    let outcome = call_service(token, ctx.service.update_items(specs, token)).await;

    reply_batch(stream, "update_items", expected, outcome).await
}

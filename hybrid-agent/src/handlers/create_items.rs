//! Create items: one `ItemResult` per input spec, streamed in input order.

use hybrid_core::ItemCreateSpec;
use hybrid_proto::custom;
use hybrid_proto::methods::RETURN_CREATE_ITEMS;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{call_service, reply_batch, HandlerContext};
use crate::error::AgentResult;
use crate::hub::HubClient;

pub(crate) async fn handle<H: HubClient>(
    ctx: &HandlerContext<H>,
    correlation_id: &str,
    payload: custom::ItemCreateRequest,
    token: &CancellationToken,
) -> AgentResult<()> {
    let expected = payload.data.len();
    info!(correlation_id, count = expected, "Handling CreateItems request");

    let stream = ctx.hub.open_stream(RETURN_CREATE_ITEMS, correlation_id, token);
    let specs = payload.data.into_iter().map(ItemCreateSpec::from).collect();
    let outcome = call_service(token, ctx.service.create_items(specs, token)).await;

    reply_batch(stream, "create_items", expected, outcome).await
}

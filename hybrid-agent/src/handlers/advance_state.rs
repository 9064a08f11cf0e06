//! Advance state: move an item to its next lifecycle state.

use hybrid_core::Id;
use hybrid_proto::custom;
use hybrid_proto::methods::RETURN_ADVANCE_STATE;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{call_service, send_reply, HandlerContext};
use crate::error::AgentResult;
use crate::hub::HubClient;

pub(crate) async fn handle<H: HubClient>(
    ctx: &HandlerContext<H>,
    correlation_id: &str,
    payload: custom::AdvanceStateRequest,
    token: &CancellationToken,
) -> AgentResult<()> {
    info!(correlation_id, "Handling AdvanceState request");

    let id = payload.id.map(Id::from).unwrap_or_default();
    call_service(token, ctx.service.advance_state(id, token)).await?;

    send_reply(ctx, token, RETURN_ADVANCE_STATE, correlation_id, custom::Void {}).await
}

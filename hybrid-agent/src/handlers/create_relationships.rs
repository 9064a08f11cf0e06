use hybrid_core::RelationshipTable;
use hybrid_proto::custom;
use hybrid_proto::methods::RETURN_CREATE_RELATIONSHIPS;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{call_service, send_reply, HandlerContext};
use crate::error::AgentResult;
use crate::hub::HubClient;

pub(crate) async fn handle<H: HubClient>(
    ctx: &HandlerContext<H>,
    correlation_id: &str,
    payload: custom::CreateRelationshipsRequest,
    token: &CancellationToken,
) -> AgentResult<()> {
    info!(
        correlation_id,
        tables = payload.relationships.len(),
        "Handling CreateRelationships request"
    );

    let tables = payload
        .relationships
        .into_iter()
        .map(RelationshipTable::from)
        .collect();
    call_service(token, ctx.service.create_relationships(tables, token)).await?;

    send_reply(ctx, token, RETURN_CREATE_RELATIONSHIPS, correlation_id, custom::Void {}).await
}

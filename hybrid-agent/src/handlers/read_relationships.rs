use hybrid_core::{Id, RelationshipType};
use hybrid_proto::custom;
use hybrid_proto::methods::RETURN_READ_RELATIONSHIPS;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{call_service, finish, write_all, HandlerContext};
use crate::error::AgentResult;
use crate::hub::HubClient;

pub(crate) async fn handle<H: HubClient>(
    ctx: &HandlerContext<H>,
    correlation_id: &str,
    payload: custom::RelationshipRequest,
    token: &CancellationToken,
) -> AgentResult<()> {
    let relationship_type = RelationshipType::from(payload.r#type());
    info!(
        correlation_id,
        ?relationship_type,
        count = payload.ids.len(),
        "Handling ReadRelationships request"
    );

    let mut stream = ctx.hub.open_stream(RETURN_READ_RELATIONSHIPS, correlation_id, token);
    let ids = payload.ids.into_iter().map(Id::from).collect();
    let outcome: AgentResult<()> = async {
        let tables = call_service(
            token,
            ctx.service.read_relationships(ids, relationship_type, token),
        )
        .await?;
        write_all(&mut stream, tables).await
    }
    .await;

    finish(stream, outcome).await
}

use hybrid_core::{Query, Type};
use hybrid_proto::custom;
use hybrid_proto::methods::RETURN_QUERY_ITEMS;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{call_service, finish, write_all, HandlerContext};
use crate::error::AgentResult;
use crate::hub::HubClient;

pub(crate) async fn handle<H: HubClient>(
    ctx: &HandlerContext<H>,
    correlation_id: &str,
    payload: custom::QueryItemsRequest,
    token: &CancellationToken,
) -> AgentResult<()> {
    info!(correlation_id, "Handling QueryItems request");

    let mut stream = ctx.hub.open_stream(RETURN_QUERY_ITEMS, correlation_id, token);
    let query = payload.query.map(Query::from).unwrap_or_default();
    let item_type = payload.r#type.map(Type::from).unwrap_or_default();
    let outcome: AgentResult<()> = async {
        let ids = call_service(token, ctx.service.query_items(query, item_type, token)).await?;
        write_all(&mut stream, ids).await
    }
    .await;

    finish(stream, outcome).await
}

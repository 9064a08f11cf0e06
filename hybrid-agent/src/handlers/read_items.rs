//! Read items: stream every item the PLM system returns for the given ids.

use hybrid_core::Id;
use hybrid_proto::custom;
use hybrid_proto::methods::RETURN_READ_ITEMS;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{call_service, finish, write_all, HandlerContext};
use crate::error::AgentResult;
use crate::hub::HubClient;

pub(crate) async fn handle<H: HubClient>(
    ctx: &HandlerContext<H>,
    correlation_id: &str,
    payload: custom::IdRequest,
    token: &CancellationToken,
) -> AgentResult<()> {
    info!(correlation_id, count = payload.data.len(), "Handling ReadItems request");

    let mut stream = ctx.hub.open_stream(RETURN_READ_ITEMS, correlation_id, token);
    let ids = payload.data.into_iter().map(Id::from).collect();
    let outcome: AgentResult<()> = async {
        let items = call_service(token, ctx.service.read_items(ids, token)).await?;
        debug!(correlation_id, found = items.len(), "Items read");
        write_all(&mut stream, items).await
    }
    .await;

    finish(stream, outcome).await
}

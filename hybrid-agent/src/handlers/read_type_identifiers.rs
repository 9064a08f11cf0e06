use hybrid_core::BaseType;
use hybrid_proto::custom;
use hybrid_proto::methods::RETURN_READ_TYPE_IDENTIFIERS;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{call_service, finish, write_all, HandlerContext};
use crate::error::AgentResult;
use crate::hub::HubClient;

pub(crate) async fn handle<H: HubClient>(
    ctx: &HandlerContext<H>,
    correlation_id: &str,
    payload: custom::TypeRequest,
    token: &CancellationToken,
) -> AgentResult<()> {
    let base_type = BaseType::from(payload.base_type());
    info!(correlation_id, ?base_type, "Handling ReadTypeIdentifiers request");

    let mut stream = ctx.hub.open_stream(RETURN_READ_TYPE_IDENTIFIERS, correlation_id, token);
    let outcome: AgentResult<()> = async {
        let identifiers =
            call_service(token, ctx.metadata.read_type_identifiers(base_type, token)).await?;
        write_all(&mut stream, identifiers).await
    }
    .await;

    finish(stream, outcome).await
}

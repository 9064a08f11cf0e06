//! Ask whether the PLM system supports a special operation.

use hybrid_core::SupportedOperation;
use hybrid_proto::custom;
use hybrid_proto::methods::RETURN_IS_OPERATION_SUPPORTED;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{call_service, send_reply, HandlerContext};
use crate::error::AgentResult;
use crate::hub::HubClient;

pub(crate) async fn handle<H: HubClient>(
    ctx: &HandlerContext<H>,
    correlation_id: &str,
    payload: custom::OperationSupportedRequest,
    token: &CancellationToken,
) -> AgentResult<()> {
    info!(correlation_id, "Handling IsOperationSupported request");

    let operation = SupportedOperation::from(payload.operation());
    let is_supported =
        call_service(token, ctx.service.is_operation_supported(operation, token)).await?;
    debug!(correlation_id, ?operation, is_supported, "Operation support resolved");

    send_reply(
        ctx,
        token,
        RETURN_IS_OPERATION_SUPPORTED,
        correlation_id,
        custom::OperationSupportedResponse { is_supported },
    )
    .await
}

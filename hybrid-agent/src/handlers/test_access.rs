//! Test access: check credentials against the PLM system.

use hybrid_core::Auth;
use hybrid_proto::convert::auth_result;
use hybrid_proto::custom;
use hybrid_proto::methods::RETURN_TEST_ACCESS;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{call_service, send_reply, HandlerContext};
use crate::error::AgentResult;
use crate::hub::HubClient;

pub(crate) async fn handle<H: HubClient>(
    ctx: &HandlerContext<H>,
    correlation_id: &str,
    payload: custom::Auth,
    token: &CancellationToken,
) -> AgentResult<()> {
    info!(correlation_id, "Handling TestAccess request");

    let auth = Auth::from(payload);
    let granted = call_service(token, ctx.service.test_access(auth, token)).await?;
    if !granted {
        info!(correlation_id, "Invalid Credentials Provided");
    }

    send_reply(ctx, token, RETURN_TEST_ACCESS, correlation_id, auth_result(granted)).await
}

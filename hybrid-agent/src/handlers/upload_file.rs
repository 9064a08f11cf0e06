//! Upload a file and report the id the PLM system assigned to it.

use hybrid_core::FileResource;
use hybrid_proto::custom;
use hybrid_proto::methods::RETURN_UPLOAD_FILE;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{call_service, send_reply, HandlerContext};
use crate::error::AgentResult;
use crate::hub::HubClient;

pub(crate) async fn handle<H: HubClient>(
    ctx: &HandlerContext<H>,
    correlation_id: &str,
    payload: custom::FileResource,
    token: &CancellationToken,
) -> AgentResult<()> {
    info!(
        correlation_id,
        file_name = %payload.file_name,
        size = payload.data.len(),
        "Handling UploadFile request"
    );

    let file = FileResource::from(payload);
    let id = call_service(token, ctx.service.upload_file(file, token)).await?;

    let response = custom::FileResourceResponse { id };
    send_reply(ctx, token, RETURN_UPLOAD_FILE, correlation_id, response).await
}

use crate::services::worker::{ContentKind, DownloadTask};
use crate::types::{ChatId, RequestId};
use actix_web::web::{Data, Json};
use actix_web::{HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;
use tracing::{error, info, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DownloadRequestBody {
    kind: ContentKind,
    argument: String,
    chat_id: ChatId,
}

/// Accepts a download request and enqueues it for the background worker. The
/// request is acknowledged as soon as it is queued; completion is reported to
/// the requester's chat.
pub(crate) async fn make_download_request(
    task_sender: Data<Sender<DownloadTask>>,
    Json(body): Json<DownloadRequestBody>,
) -> impl Responder {
    let task = DownloadTask {
        id: RequestId::new(),
        kind: body.kind,
        argument: body.argument,
        requester: body.chat_id,
    };
    let request_id = task.id.clone();

    match task_sender.try_send(task) {
        Ok(()) => {
            info!(%request_id, kind = ?body.kind, "Queued download request");

            HttpResponse::Ok().json(json!({ "requestId": request_id }))
        }
        Err(TrySendError::Full(_)) => {
            warn!("Download queue is full, rejecting request");

            HttpResponse::ServiceUnavailable().finish()
        }
        Err(TrySendError::Closed(_)) => {
            error!("Download queue is closed");

            HttpResponse::InternalServerError().finish()
        }
    }
}

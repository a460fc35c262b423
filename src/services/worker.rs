use crate::services::download_processor::DownloadProcessor;
use crate::types::{ChatId, RequestId};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc::{Receiver, Sender};
use tracing::{error, info, warn};

/// Kind of catalog object a download request refers to.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ContentKind {
    Artist,
    Album,
    Book,
    Podcast,
    Playlist,
}

#[derive(Debug, Clone)]
pub(crate) struct DownloadTask {
    pub(crate) id: RequestId,
    pub(crate) kind: ContentKind,
    pub(crate) argument: String,
    pub(crate) requester: ChatId,
}

#[derive(Debug, Clone)]
pub(crate) struct TaskResult {
    pub(crate) requester: ChatId,
    pub(crate) message: String,
}

#[derive(Debug, thiserror::Error)]
#[error("Unable to deliver notification: {0}")]
pub(crate) struct ChatNotifierError(pub(crate) Box<dyn std::error::Error + Send + Sync>);

/// Delivers task results back to the chat that requested them.
#[async_trait]
pub(crate) trait ChatNotifier: Send + Sync {
    async fn notify(&self, chat_id: &ChatId, text: &str) -> Result<(), ChatNotifierError>;
}

/// Consumes queued download tasks one at a time. Every task produces exactly
/// one result message, whether it succeeded or failed.
pub(crate) async fn run_download_worker(
    mut task_receiver: Receiver<DownloadTask>,
    processor: Arc<DownloadProcessor>,
    result_sender: Sender<TaskResult>,
) {
    while let Some(task) = task_receiver.recv().await {
        info!(request_id = %task.id, kind = ?task.kind, argument = %task.argument, "Processing download task");

        let message = match processor.process_task(&task).await {
            Ok(summary) => summary,
            Err(error) => {
                error!(request_id = %task.id, %error, "Download task failed");
                format!("Download failed: {}", error)
            }
        };

        let result = TaskResult {
            requester: task.requester,
            message,
        };

        if result_sender.send(result).await.is_err() {
            warn!("Result channel closed, stopping download worker");
            break;
        }
    }

    info!("Download worker finished");
}

/// Forwards task results to the notifier. Delivery failures are logged and
/// never interrupt the loop.
pub(crate) async fn run_delivery_worker(
    mut result_receiver: Receiver<TaskResult>,
    notifier: Arc<dyn ChatNotifier>,
) {
    while let Some(result) = result_receiver.recv().await {
        if let Err(error) = notifier.notify(&result.requester, &result.message).await {
            error!(chat_id = %result.requester, %error, "Unable to deliver task result");
        }
    }

    info!("Delivery worker finished");
}

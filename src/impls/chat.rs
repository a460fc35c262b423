use crate::services::telegram::TelegramClient;
use crate::services::worker::{ChatNotifier, ChatNotifierError};
use crate::types::ChatId;
use async_trait::async_trait;

#[async_trait]
impl ChatNotifier for TelegramClient {
    async fn notify(&self, chat_id: &ChatId, text: &str) -> Result<(), ChatNotifierError> {
        self.send_message(chat_id, text)
            .await
            .map_err(|error| ChatNotifierError(Box::new(error)))
    }
}

use crate::types::ChatId;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

const TELEGRAM_ENDPOINT: &str = "https://api.telegram.org";

pub(crate) struct TelegramClient {
    token: String,
    client: Client,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum TelegramClientError {
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
}

impl TelegramClient {
    pub(crate) fn create(token: String) -> Self {
        let client = Client::builder()
            .build()
            .expect("Failed to create HTTP Client");

        Self { token, client }
    }

    pub(crate) async fn send_message(
        &self,
        chat_id: &ChatId,
        text: &str,
    ) -> Result<(), TelegramClientError> {
        debug!(chat_id = %chat_id, "Sending chat message");

        self.client
            .post(format!(
                "{}/bot{}/sendMessage",
                TELEGRAM_ENDPOINT, self.token
            ))
            .json(&json!({
                "chat_id": **chat_id,
                "text": text,
            }))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

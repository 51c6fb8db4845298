//! Telegram Bot API client used as the chat transport wire layer

use crate::config::TelegramConfig;
use crate::error::{CourierError, Result};
use crate::workflow::{ChatId, DraftAction, MessageId, MessageRef};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;

/// One update from the Telegram long poll
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    pub chat: TelegramChat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

/// A button click on an inline keyboard
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: TelegramUser,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub data: Option<String>,
}

/// Standard Telegram API response envelope
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramClient {
    bot_token: String,
    http_client: HttpClient,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> Result<Self> {
        // Long-poll requests hold the connection open, so the client timeout
        // must exceed the poll timeout passed to getUpdates.
        let http_client = HttpClient::builder()
            .timeout(std::time::Duration::from_secs(90))
            .build()
            .map_err(CourierError::Http)?;

        Ok(Self {
            bot_token: config.bot_token,
            http_client,
        })
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.bot_token, method)
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        payload: serde_json::Value,
    ) -> Result<T> {
        let response = self
            .http_client
            .post(self.api_url(method))
            .json(&payload)
            .send()
            .await?;

        let envelope: ApiResponse<T> = response.json().await?;
        if !envelope.ok {
            return Err(CourierError::Transport(format!(
                "Telegram {} failed: {}",
                method,
                envelope.description.unwrap_or_else(|| "unknown error".to_string())
            )));
        }

        envelope.result.ok_or_else(|| {
            CourierError::Transport(format!("Telegram {} returned no result", method))
        })
    }

    /// Post a draft with its inline action buttons, returning the handle of
    /// the created message
    pub async fn send_message_with_actions(
        &self,
        chat: &ChatId,
        text: &str,
        actions: &[(DraftAction, &str)],
    ) -> Result<MessageRef> {
        let buttons: Vec<serde_json::Value> = actions
            .iter()
            .map(|(action, label)| json!({"text": label, "callback_data": action.as_str()}))
            .collect();

        let payload = json!({
            "chat_id": chat.as_str(),
            "text": text,
            "reply_markup": {"inline_keyboard": [buttons]}
        });

        let message: IncomingMessage = self.call("sendMessage", payload).await?;

        log::info!(
            "Posted draft message {} to chat {}",
            message.message_id,
            chat
        );

        Ok(MessageRef {
            chat: chat.clone(),
            message_id: MessageId::new(message.message_id),
        })
    }

    /// Send a plain notification message without buttons
    pub async fn send_message(&self, chat: &ChatId, text: &str) -> Result<()> {
        let payload = json!({
            "chat_id": chat.as_str(),
            "text": text
        });

        let _: IncomingMessage = self.call("sendMessage", payload).await?;
        Ok(())
    }

    /// Remove the inline keyboard from a posted message.
    ///
    /// Idempotent: a keyboard that is already gone (or a message the
    /// transport already deleted) is treated as success.
    pub async fn clear_actions(&self, message: &MessageRef) -> Result<()> {
        let payload = json!({
            "chat_id": message.chat.as_str(),
            "message_id": message.message_id.value(),
            "reply_markup": {"inline_keyboard": []}
        });

        match self
            .call::<serde_json::Value>("editMessageReplyMarkup", payload)
            .await
        {
            Ok(_) => Ok(()),
            Err(CourierError::Transport(description))
                if description.contains("message is not modified")
                    || description.contains("message to edit not found") =>
            {
                log::debug!(
                    "Actions on message {} already removed",
                    message.message_id.value()
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Acknowledge a button click so the client stops its spinner
    pub async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        let payload = json!({"callback_query_id": callback_id});

        // answerCallbackQuery returns a bare boolean result
        let _: serde_json::Value = self.call("answerCallbackQuery", payload).await?;
        Ok(())
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>> {
        let mut payload = json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message", "callback_query"]
        });
        if let Some(offset) = offset {
            payload["offset"] = json!(offset);
        }

        self.call("getUpdates", payload).await
    }
}

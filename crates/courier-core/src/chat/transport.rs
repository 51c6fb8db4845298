//! Chat transport abstraction over the Telegram wire client

use super::router::UpdateRouter;
use crate::clients::telegram::TelegramClient;
use crate::error::Result;
use crate::workflow::{ChatId, DraftAction, MessageRef, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// The channel operations the workflow needs from a chat platform.
///
/// Timeouts are first-class outcomes: both bounded waits resolve to
/// `Ok(None)` when the window elapses, never to an error.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Post a draft with its three action buttons, returning the handle of
    /// the live message
    async fn post_draft(&self, chat: &ChatId, text: &str) -> Result<MessageRef>;

    /// Wait up to `window` for one send/cancel/edit click on `message` by
    /// `user`. Clicks from anyone else, or on any other message, are ignored.
    async fn await_action(
        &self,
        message: &MessageRef,
        user: UserId,
        window: Duration,
    ) -> Result<Option<DraftAction>>;

    /// Wait up to `window` for one free-text reply in `chat` by `user`
    async fn await_reply(
        &self,
        chat: &ChatId,
        user: UserId,
        window: Duration,
    ) -> Result<Option<String>>;

    /// Disable the action buttons on `message`. Idempotent.
    async fn remove_actions(&self, message: &MessageRef) -> Result<()>;

    /// Post a plain notification message
    async fn notify(&self, chat: &ChatId, text: &str) -> Result<()>;
}

/// Production transport: Telegram API calls plus the process-wide router
pub struct TelegramTransport {
    client: Arc<TelegramClient>,
    router: Arc<UpdateRouter>,
}

impl TelegramTransport {
    pub fn new(client: Arc<TelegramClient>, router: Arc<UpdateRouter>) -> Self {
        Self { client, router }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn post_draft(&self, chat: &ChatId, text: &str) -> Result<MessageRef> {
        let actions = [
            (DraftAction::Send, "Send Email"),
            (DraftAction::Cancel, "Cancel"),
            (DraftAction::Edit, "Edit"),
        ];
        self.client
            .send_message_with_actions(chat, text, &actions)
            .await
    }

    async fn await_action(
        &self,
        message: &MessageRef,
        user: UserId,
        window: Duration,
    ) -> Result<Option<DraftAction>> {
        let mut wait = self.router.subscribe_actions(message, user);

        match timeout(window, wait.recv()).await {
            Ok(Some(routed)) => {
                // Stop the client-side spinner; a failed ack is not worth
                // losing the collected action over.
                if let Err(e) = self.client.answer_callback(&routed.callback_id).await {
                    log::warn!("Failed to acknowledge callback: {}", e);
                }
                Ok(Some(routed.action))
            }
            // Router torn down while waiting: treat like a timeout
            Ok(None) => Ok(None),
            Err(_) => Ok(None),
        }
    }

    async fn await_reply(
        &self,
        chat: &ChatId,
        user: UserId,
        window: Duration,
    ) -> Result<Option<String>> {
        let mut wait = self.router.subscribe_text(chat, user);

        match timeout(window, wait.recv()).await {
            Ok(Some(routed)) => Ok(Some(routed.text)),
            Ok(None) => Ok(None),
            Err(_) => Ok(None),
        }
    }

    async fn remove_actions(&self, message: &MessageRef) -> Result<()> {
        self.client.clear_actions(message).await
    }

    async fn notify(&self, chat: &ChatId, text: &str) -> Result<()> {
        self.client.send_message(chat, text).await
    }
}

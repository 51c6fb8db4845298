//! Bounded wait for an edit-request follow-up reply

use super::types::{ChatId, UserId};
use crate::chat::ChatTransport;
use crate::constants::EDIT_REPLY_TIMEOUT_SECS;
use crate::error::Result;
use std::time::Duration;

/// Captures exactly one free-text follow-up from the authorized user.
///
/// Only messages authored by the scoped user in the scoped chat are eligible;
/// the first one within the window wins. `Ok(None)` means the window elapsed
/// with no eligible reply.
pub struct EditSolicitor {
    chat: ChatId,
    user: UserId,
    window: Duration,
}

impl EditSolicitor {
    pub fn new(chat: ChatId, user: UserId) -> Self {
        Self {
            chat,
            user,
            window: Duration::from_secs(EDIT_REPLY_TIMEOUT_SECS),
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub async fn solicit<C: ChatTransport + ?Sized>(self, transport: &C) -> Result<Option<String>> {
        let reply = transport
            .await_reply(&self.chat, self.user, self.window)
            .await?;

        match &reply {
            Some(_) => log::info!("Received edit instructions in chat {}", self.chat),
            None => log::info!(
                "No edit reply in chat {} within {:?}",
                self.chat,
                self.window
            ),
        }

        Ok(reply)
    }
}

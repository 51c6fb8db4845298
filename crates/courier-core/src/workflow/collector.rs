//! Single-use action collection for one posted draft

use super::types::{DraftAction, MessageRef, UserId};
use crate::chat::ChatTransport;
use crate::constants::ACTION_TIMEOUT_SECS;
use crate::error::Result;
use std::time::Duration;

/// Outcome of one collection window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collected {
    Action(DraftAction),
    /// The idle window elapsed without an accepted action
    Expired,
}

/// Scoped, single-use listener for the three actions on one live draft
/// message.
///
/// Consuming `collect` guarantees at most one accepted action per collector
/// lifetime; the underlying subscription is torn down when the call returns,
/// so stale clicks on a superseded message can never reach the workflow.
pub struct ActionCollector {
    message: MessageRef,
    user: UserId,
    window: Duration,
}

impl ActionCollector {
    pub fn new(message: MessageRef, user: UserId) -> Self {
        Self {
            message,
            user,
            window: Duration::from_secs(ACTION_TIMEOUT_SECS),
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn message(&self) -> &MessageRef {
        &self.message
    }

    /// Wait for the first accepted action, or expiry of the idle window
    pub async fn collect<C: ChatTransport + ?Sized>(self, transport: &C) -> Result<Collected> {
        match transport
            .await_action(&self.message, self.user, self.window)
            .await?
        {
            Some(action) => {
                log::info!(
                    "Collected {:?} on message {}",
                    action,
                    self.message.message_id.value()
                );
                Ok(Collected::Action(action))
            }
            None => {
                log::info!(
                    "No action on message {} within {:?}",
                    self.message.message_id.value(),
                    self.window
                );
                Ok(Collected::Expired)
            }
        }
    }
}

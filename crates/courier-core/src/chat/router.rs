//! Scoped routing of chat updates to waiting workflow instances
//!
//! Every wait on user input is an explicit subscription with an explicit
//! scope (target message and user for button clicks, chat and user for text
//! replies). A subscription receives at most one update and is unregistered
//! either when it fires or when its guard is dropped, so a retired draft can
//! never observe a late click.

use crate::clients::telegram::Update;
use crate::workflow::{ChatId, DraftAction, MessageRef, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// A button click delivered to an action subscription
#[derive(Debug)]
pub struct RoutedAction {
    pub action: DraftAction,
    pub callback_id: String,
}

/// A free-text reply delivered to a text subscription
#[derive(Debug)]
pub struct RoutedText {
    pub text: String,
}

struct ActionSlot {
    message: MessageRef,
    user: UserId,
    tx: Option<oneshot::Sender<RoutedAction>>,
}

struct TextSlot {
    chat: ChatId,
    user: UserId,
    tx: Option<oneshot::Sender<RoutedText>>,
}

#[derive(Default)]
struct RouterInner {
    next_token: u64,
    actions: HashMap<u64, ActionSlot>,
    texts: HashMap<u64, TextSlot>,
}

/// Process-wide dispatcher between the single update poll and the scoped
/// waits of all in-flight workflow instances
#[derive(Default)]
pub struct UpdateRouter {
    inner: Mutex<RouterInner>,
}

impl UpdateRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single-use wait for a button click on `message` by `user`
    pub fn subscribe_actions(self: &Arc<Self>, message: &MessageRef, user: UserId) -> ActionWait {
        let (tx, rx) = oneshot::channel();
        let token = {
            let mut inner = self.inner.lock().expect("router lock poisoned");
            let token = inner.next_token;
            inner.next_token += 1;
            inner.actions.insert(
                token,
                ActionSlot {
                    message: message.clone(),
                    user,
                    tx: Some(tx),
                },
            );
            token
        };

        ActionWait {
            token,
            rx,
            router: Arc::clone(self),
        }
    }

    /// Register a single-use wait for a text reply in `chat` by `user`
    pub fn subscribe_text(self: &Arc<Self>, chat: &ChatId, user: UserId) -> TextWait {
        let (tx, rx) = oneshot::channel();
        let token = {
            let mut inner = self.inner.lock().expect("router lock poisoned");
            let token = inner.next_token;
            inner.next_token += 1;
            inner.texts.insert(
                token,
                TextSlot {
                    chat: chat.clone(),
                    user,
                    tx: Some(tx),
                },
            );
            token
        };

        TextWait {
            token,
            rx,
            router: Arc::clone(self),
        }
    }

    /// Route one update to a matching subscription.
    ///
    /// Returns the update back to the caller when no subscription consumed
    /// it, so the bot loop can treat it as a fresh command (or as a stale
    /// click that only needs acknowledging).
    pub fn route(&self, update: Update) -> Option<Update> {
        if let Some(callback) = &update.callback_query {
            let action = callback.data.as_deref().and_then(DraftAction::parse);
            let message = callback.message.as_ref();

            if let (Some(action), Some(message)) = (action, message) {
                let chat = ChatId::new(message.chat.id.to_string());
                let clicked = MessageRef {
                    chat,
                    message_id: crate::workflow::MessageId::new(message.message_id),
                };
                let user = UserId::new(callback.from.id);

                let mut inner = self.inner.lock().expect("router lock poisoned");
                let matched = inner
                    .actions
                    .iter_mut()
                    .find(|(_, slot)| slot.message == clicked && slot.user == user)
                    .and_then(|(token, slot)| slot.tx.take().map(|tx| (*token, tx)));

                if let Some((token, tx)) = matched {
                    inner.actions.remove(&token);
                    let routed = RoutedAction {
                        action,
                        callback_id: callback.id.clone(),
                    };
                    // Receiver gone means the wait already timed out; the
                    // click falls through as unrouted.
                    if tx.send(routed).is_ok() {
                        return None;
                    }
                }
            }

            return Some(update);
        }

        if let Some(message) = &update.message {
            let text = match message.text.as_deref() {
                Some(text) => text,
                None => return Some(update),
            };
            let from = match &message.from {
                Some(from) if !from.is_bot => from,
                _ => return Some(update),
            };

            let chat = ChatId::new(message.chat.id.to_string());
            let user = UserId::new(from.id);

            let mut inner = self.inner.lock().expect("router lock poisoned");
            let matched = inner
                .texts
                .iter_mut()
                .find(|(_, slot)| slot.chat == chat && slot.user == user)
                .and_then(|(token, slot)| slot.tx.take().map(|tx| (*token, tx)));

            if let Some((token, tx)) = matched {
                inner.texts.remove(&token);
                let routed = RoutedText {
                    text: text.to_string(),
                };
                if tx.send(routed).is_ok() {
                    return None;
                }
            }
        }

        Some(update)
    }

    fn unsubscribe_action(&self, token: u64) {
        let mut inner = self.inner.lock().expect("router lock poisoned");
        inner.actions.remove(&token);
    }

    fn unsubscribe_text(&self, token: u64) {
        let mut inner = self.inner.lock().expect("router lock poisoned");
        inner.texts.remove(&token);
    }
}

/// Guard for one registered action wait. Dropping it tears the scope down.
pub struct ActionWait {
    token: u64,
    rx: oneshot::Receiver<RoutedAction>,
    router: Arc<UpdateRouter>,
}

impl ActionWait {
    /// Wait for the routed click. Resolves to `None` only if the router was
    /// torn down while waiting.
    pub async fn recv(&mut self) -> Option<RoutedAction> {
        (&mut self.rx).await.ok()
    }
}

impl Drop for ActionWait {
    fn drop(&mut self) {
        self.router.unsubscribe_action(self.token);
    }
}

/// Guard for one registered text wait. Dropping it tears the scope down.
pub struct TextWait {
    token: u64,
    rx: oneshot::Receiver<RoutedText>,
    router: Arc<UpdateRouter>,
}

impl TextWait {
    pub async fn recv(&mut self) -> Option<RoutedText> {
        (&mut self.rx).await.ok()
    }
}

impl Drop for TextWait {
    fn drop(&mut self) {
        self.router.unsubscribe_text(self.token);
    }
}

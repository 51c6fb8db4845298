//! Chat command parsing for the `!email` trigger

use super::types::{ChatId, UserId, WorkflowId};
use crate::error::{CourierError, Result};
use std::collections::BTreeSet;

/// Command prefix that starts a workflow instance
pub const EMAIL_COMMAND: &str = "!email";

/// A parsed `!email <url> [address ...]` invocation
#[derive(Debug, Clone)]
pub struct CommandTrigger {
    pub workflow_id: WorkflowId,
    pub url: String,
    pub extra_recipients: BTreeSet<String>,
    pub user: UserId,
    pub chat: ChatId,
}

impl CommandTrigger {
    /// Parse a chat message into a trigger.
    ///
    /// Returns `Ok(None)` when the message is not an `!email` command at all,
    /// and `Err(Usage)` when it is one but the URL argument is missing.
    pub fn parse(text: &str, user: UserId, chat: ChatId) -> Result<Option<Self>> {
        let mut tokens = text.split_whitespace();

        match tokens.next() {
            Some(EMAIL_COMMAND) => {}
            _ => return Ok(None),
        }

        let url = tokens
            .next()
            .ok_or_else(|| {
                CourierError::Usage(format!("Usage: {} <url> [address ...]", EMAIL_COMMAND))
            })?
            .to_string();

        let extra_recipients: BTreeSet<String> = tokens.map(str::to_string).collect();

        Ok(Some(Self {
            workflow_id: WorkflowId::new(),
            url,
            extra_recipients,
            user,
            chat,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Option<CommandTrigger>> {
        CommandTrigger::parse(text, UserId::new(42), ChatId::new("chat-1"))
    }

    #[test]
    fn test_parse_full_command() {
        let trigger = parse("!email https://example.com a@x.com b@x.com a@x.com")
            .unwrap()
            .unwrap();

        assert_eq!(trigger.url, "https://example.com");
        // Duplicates collapse
        assert_eq!(trigger.extra_recipients.len(), 2);
        assert!(trigger.extra_recipients.contains("a@x.com"));
        assert!(trigger.extra_recipients.contains("b@x.com"));
        assert_eq!(trigger.user, UserId::new(42));
    }

    #[test]
    fn test_parse_without_recipients() {
        let trigger = parse("!email https://example.com").unwrap().unwrap();
        assert!(trigger.extra_recipients.is_empty());
    }

    #[test]
    fn test_missing_url_is_usage_error() {
        let err = parse("!email").unwrap_err();
        assert!(matches!(err, CourierError::Usage(_)));
    }

    #[test]
    fn test_non_command_is_ignored() {
        assert!(parse("hello there").unwrap().is_none());
        assert!(parse("").unwrap().is_none());
        // Prefix must match as a whole token
        assert!(parse("!emails https://example.com").unwrap().is_none());
    }
}

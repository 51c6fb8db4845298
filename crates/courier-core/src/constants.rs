/// Workflow configuration constants

/// Subject line used for every generated email
pub const EMAIL_SUBJECT: &str = "Generated Email";

/// How long a posted draft waits for a send/cancel/edit action before expiring
pub const ACTION_TIMEOUT_SECS: u64 = 300;

/// How long an edit request waits for the follow-up free-text reply
pub const EDIT_REPLY_TIMEOUT_SECS: u64 = 30;

/// Maximum number of extracted page characters fed into draft generation
pub const PAGE_TEXT_CONTEXT_LIMIT: usize = 8_000;

//! Strongly typed workflow state and draft bookkeeping
//! No string-based state management - everything is strongly typed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Strongly typed WorkflowId
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowId(String);

impl WorkflowId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for WorkflowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strongly typed chat user ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Strongly typed chat message ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(i64);

impl MessageId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Strongly typed chat (channel) ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(String);

impl ChatId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to the chat message currently displaying a draft with its action
/// buttons. At most one of these is live per workflow instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat: ChatId,
    pub message_id: MessageId,
}

/// The three user actions offered on a posted draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftAction {
    Send,
    Cancel,
    Edit,
}

impl DraftAction {
    /// Wire identifier used as button callback data
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Cancel => "cancel",
            Self::Edit => "edit",
        }
    }

    /// Parse a callback identifier; unknown identifiers are ignored upstream
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "send" => Some(Self::Send),
            "cancel" => Some(Self::Cancel),
            "edit" => Some(Self::Edit),
            _ => None,
        }
    }
}

/// Workflow instance state
///
/// `Sent`, `Canceled`, `Expired` and `Failed` are terminal; reaching any of
/// them ends the instance and triggers cleanup of the posted controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowState {
    Drafting,
    AwaitingAction,
    Editing,
    Sent,
    Canceled,
    Expired,
    Failed,
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Sent | Self::Canceled | Self::Expired | Self::Failed
        )
    }
}

/// A generated draft. Replaced whole (never merged) on regeneration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    pub content: String,
    pub version: u32,
}

/// User feedback attached to a draft revision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub text: String,
    pub provided_by: UserId,
    pub provided_at: DateTime<Utc>,
}

/// One entry in the draft revision history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftHistoryEntry {
    pub version: u32,
    pub content: String,
    pub feedback: Option<Feedback>,
    pub created_at: DateTime<Utc>,
}

/// Mutable per-instance session: the current draft, its revision history and
/// the workflow state. Owned exclusively by the coordinator.
#[derive(Debug, Clone)]
pub struct DraftSession {
    pub workflow_id: WorkflowId,
    pub state: WorkflowState,
    current: Draft,
    history: Vec<DraftHistoryEntry>,
    started_at: DateTime<Utc>,
}

impl DraftSession {
    /// Create a session around the initial draft (version 0)
    pub fn new(workflow_id: WorkflowId, initial_content: String) -> Self {
        let now = Utc::now();
        let current = Draft {
            content: initial_content.clone(),
            version: 0,
        };
        let first_entry = DraftHistoryEntry {
            version: 0,
            content: initial_content,
            feedback: None,
            created_at: now,
        };

        Self {
            workflow_id,
            state: WorkflowState::Drafting,
            current,
            history: vec![first_entry],
            started_at: now,
        }
    }

    pub fn draft(&self) -> &Draft {
        &self.current
    }

    pub fn history(&self) -> &[DraftHistoryEntry] {
        &self.history
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Attach feedback to the revision it was given on
    pub fn record_feedback(&mut self, text: String, user: UserId) {
        let feedback = Feedback {
            text,
            provided_by: user,
            provided_at: Utc::now(),
        };

        if let Some(entry) = self.history.last_mut() {
            entry.feedback = Some(feedback);
        }
    }

    /// Replace the draft with a regenerated revision, bumping the version
    pub fn replace_draft(&mut self, content: String) {
        let version = self.current.version + 1;
        self.history.push(DraftHistoryEntry {
            version,
            content: content.clone(),
            feedback: None,
            created_at: Utc::now(),
        });
        self.current = Draft { content, version };
    }

    /// Transition into a terminal state. Panics in debug builds if the
    /// session already reached a terminal state.
    pub fn finish(&mut self, state: WorkflowState) {
        debug_assert!(state.is_terminal());
        debug_assert!(!self.state.is_terminal());
        self.state = state;
    }
}

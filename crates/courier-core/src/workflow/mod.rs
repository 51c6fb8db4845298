//! Workflow management module

pub mod collector;
pub mod orchestrator;
pub mod solicitor;
pub mod traits;
pub mod trigger;
pub mod types;

pub use collector::{ActionCollector, Collected};
pub use orchestrator::WorkflowOrchestrator;
pub use solicitor::EditSolicitor;
pub use traits::DraftPipeline;
pub use trigger::{CommandTrigger, EMAIL_COMMAND};
pub use types::{
    ChatId, Draft, DraftAction, DraftHistoryEntry, DraftSession, Feedback, MessageId, MessageRef,
    UserId, WorkflowId, WorkflowState,
};

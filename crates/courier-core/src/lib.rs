//! Courier Core Library
//!
//! Business logic for the courier email bot: a chat command turns a web page
//! into a drafted email, the draft is posted for interactive approval, and
//! only an explicit send action dispatches it.

pub mod chat;
pub mod clients;
pub mod config;
pub mod constants;
pub mod error;
pub mod services;
pub mod types;
pub mod workflow;

// Re-export main types for easy access
pub use config::CourierConfig;
pub use error::{CourierError, Result};

// Re-export client types
pub use clients::{DraftGenerator, MailClient, PageExtractor, TelegramClient};

// Re-export chat transport types
pub use chat::{ChatTransport, TelegramTransport, UpdateRouter};

// Re-export service types
pub use services::DraftProcessor;

// Re-export workflow types
pub use workflow::{
    ActionCollector,
    ChatId,
    Collected,
    CommandTrigger,
    Draft,
    DraftAction,
    DraftPipeline,
    DraftSession,
    EditSolicitor,
    MessageId,
    MessageRef,
    UserId,
    WorkflowId,
    WorkflowOrchestrator,
    WorkflowState,
};

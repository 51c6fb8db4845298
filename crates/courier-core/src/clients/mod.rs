//! Client modules for external services

pub mod extractor;
pub mod generator;
pub mod mailer;
pub mod telegram;

// Re-export all client types
pub use extractor::PageExtractor;
pub use generator::DraftGenerator;
pub use mailer::MailClient;
pub use telegram::TelegramClient;

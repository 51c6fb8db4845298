//! Error types for the courier system

use thiserror::Error;

/// Main error type for all courier operations
#[derive(Error, Debug)]
pub enum CourierError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Page fetch failed: {0}")]
    Fetch(String),

    #[error("Draft generation failed: {0}")]
    Generation(String),

    #[error("Email delivery failed: {0}")]
    Delivery(String),

    #[error("Chat transport error: {0}")]
    Transport(String),

    #[error("Workflow error: {0}")]
    Workflow(String),
}

/// Result type for courier operations
pub type Result<T> = std::result::Result<T, CourierError>;

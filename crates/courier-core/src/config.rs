//! Configuration management for the courier system

use crate::error::{CourierError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure, loaded from credentials.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierConfig {
    pub telegram: TelegramConfig,
    pub openai: OpenAIConfig,
    pub smtp: SmtpConfig,

    #[serde(default)]
    pub team: TeamConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub model: String,

    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    pub username: String,
    pub password: String,
    pub from_name: String,
    pub from_address: String,
}

/// Team roster used for recipient resolution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamConfig {
    /// Email addresses that every generated email goes to
    #[serde(default)]
    pub members: Vec<String>,
}

fn default_smtp_port() -> u16 {
    587
}

impl CourierConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CourierError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_json_str(&content)
    }

    /// Load configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: CourierConfig = serde_json::from_str(json)
            .map_err(|e| CourierError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.is_empty() {
            return Err(CourierError::Config(
                "Telegram bot token is required".to_string(),
            ));
        }

        if self.openai.api_key.is_empty() {
            return Err(CourierError::Config("OpenAI API key is required".to_string()));
        }

        if self.smtp.host.is_empty() || self.smtp.from_address.is_empty() {
            return Err(CourierError::Config(
                "SMTP host and from_address are required".to_string(),
            ));
        }

        Ok(())
    }
}

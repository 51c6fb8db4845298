//! Email draft generation using the OpenAI chat completions API

use crate::config::OpenAIConfig;
use crate::error::{CourierError, Result};
use reqwest::Client as HttpClient;
use serde_json::json;

pub struct DraftGenerator {
    config: OpenAIConfig,
    http_client: HttpClient,
}

impl DraftGenerator {
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(CourierError::Http)?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Generate an email body from free-text context
    pub async fn generate(&self, context: &str) -> Result<String> {
        let prompt = Self::build_prompt(context);

        let api_url = self
            .config
            .base_url
            .as_ref()
            .map(|url| format!("{}/chat/completions", url))
            .unwrap_or_else(|| "https://api.openai.com/v1/chat/completions".to_string());

        let response = self
            .http_client
            .post(&api_url)
            .bearer_auth(&self.config.api_key)
            .json(&json!({
                "model": self.config.model,
                "messages": [
                    {
                        "role": "system",
                        "content": "You write concise, professional emails for a team. Respond with the email body only."
                    },
                    {
                        "role": "user",
                        "content": prompt
                    }
                ],
                "max_tokens": 1024,
                "temperature": 0.5
            }))
            .send()
            .await
            .map_err(|e| CourierError::Generation(format!("OpenAI request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(CourierError::Generation(format!(
                "OpenAI API returned {}",
                response.status()
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CourierError::Generation(format!("Invalid OpenAI response: {}", e)))?;

        let content = result["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                CourierError::Generation("No content in OpenAI response".to_string())
            })?;

        Ok(content.trim().to_string())
    }

    fn build_prompt(context: &str) -> String {
        format!("Write an email to send to the team:\n\n{}\n\nEmail:", context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_context() {
        let prompt = DraftGenerator::build_prompt("Example\nHello");
        assert!(prompt.starts_with("Write an email to send to the team:"));
        assert!(prompt.contains("Example\nHello"));
        assert!(prompt.ends_with("Email:"));
    }
}

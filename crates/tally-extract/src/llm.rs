//! The language-model seam and its HTTP implementation.

use crate::error::LlmError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// How much of an error response body to keep for diagnostics.
const ERROR_BODY_MAX_BYTES: usize = 512;

/// An opaque text-in/text-out completion service.
///
/// One call per classification; no streaming, no internal retries. The
/// implementation is expected to bound the call with its own timeout.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Sends `prompt` and returns the raw completion text.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Configuration for [`OpenAiCompatClient`].
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Base URL without trailing slash (e.g. `https://api.openai.com/v1`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer API key.
    #[serde(default)]
    pub api_key: String,

    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Whole-request timeout in seconds. A timed-out classification call
    /// degrades to an empty result at the classifier layer.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            model: default_model(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint
/// (OpenAI, Groq, OpenRouter, a local llama.cpp server, ...).
#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    config: LlmConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiCompatClient {
    /// Builds a client with the configured request timeout.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { config, client })
    }

    /// The model identifier this client sends.
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompatClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0.2,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: truncate_body(body),
            });
        }

        let decoded: ChatResponse = response.json().await?;
        decoded
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(LlmError::MissingContent)
    }
}

/// Truncates an error body on a char boundary.
fn truncate_body(mut body: String) -> String {
    if body.len() > ERROR_BODY_MAX_BYTES {
        let mut cut = ERROR_BODY_MAX_BYTES;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        let body = "é".repeat(ERROR_BODY_MAX_BYTES);
        let cut = truncate_body(body);
        assert!(cut.len() <= ERROR_BODY_MAX_BYTES);
        assert!(cut.chars().all(|c| c == 'é'));
    }

    #[test]
    fn config_defaults_from_empty_toml() {
        let config: LlmConfig = toml::from_str("").unwrap();
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn chat_response_decodes_standard_shape() {
        let json = r#"{
            "choices": [{"message": {"role": "assistant", "content": "hello"}}]
        }"#;
        let decoded: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(decoded.choices[0].message.content.as_deref(), Some("hello"));
    }
}

//! OpenAI-compatible completion provider.
//!
//! Works with OpenAI and any endpoint following the chat completions API
//! format (Azure OpenAI, Ollama, vLLM, LM Studio).

use super::CompletionProvider;
use crate::config::LlmConfig;
use crate::error::{LlmError, ServiceError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible completion provider.
pub struct OpenAiCompatibleProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    timeout_secs: Option<u64>,
}

impl std::fmt::Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl OpenAiCompatibleProvider {
    /// Create a provider from configuration.
    ///
    /// Reads the API key from `config.api_key` or the environment variable
    /// named by `config.api_key_env`.
    pub fn new(config: &LlmConfig) -> Result<Self, ServiceError> {
        let api_key = config
            .resolve_api_key()
            .ok_or_else(|| ServiceError::MissingCredential {
                var: config.api_key_env.clone(),
            })?;
        Self::new_with_key(config, api_key).map_err(ServiceError::from)
    }

    /// Create a provider with an explicitly provided API key.
    pub fn new_with_key(config: &LlmConfig, api_key: String) -> Result<Self, LlmError> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| LlmError::Transport {
            message: format!("Failed to build HTTP client: {}", e),
        })?;

        Ok(Self {
            client,
            base_url,
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Build the JSON request body for a single user-role message.
    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        })
    }

    /// Extract `choices[0].message.content` from an OpenAI-format response.
    fn parse_response(body: &Value) -> Result<String, LlmError> {
        let choice = body
            .get("choices")
            .and_then(|c| c.get(0))
            .ok_or_else(|| LlmError::ResponseParse {
                message: "No choices in response".to_string(),
            })?;

        choice
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| LlmError::ResponseParse {
                message: "No message content in first choice".to_string(),
            })
    }

    fn map_send_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout {
                timeout_secs: self.timeout_secs.unwrap_or_default(),
            }
        } else {
            LlmError::Transport {
                message: format!("Request failed: {}", e),
            }
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompatibleProvider {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(prompt);

        debug!(url = %url, model = %self.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let response_body = response
            .text()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Completion provider returned an error");
            debug!(body = %response_body, "Provider error body");
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: response_body,
            });
        }

        let json: Value =
            serde_json::from_str(&response_body).map_err(|e| LlmError::ResponseParse {
                message: format!("Invalid JSON: {}", e),
            })?;

        Self::parse_response(&json)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> LlmConfig {
        LlmConfig {
            model: "gpt-4.1-mini".to_string(),
            api_key_env: "SIDEBYSIDE_TEST_OPENAI_KEY_UNSET".to_string(),
            api_key: None,
            base_url: None,
            temperature: 0.2,
            timeout_secs: None,
        }
    }

    #[test]
    fn test_request_body_shape() {
        let provider = OpenAiCompatibleProvider::new_with_key(&test_config(), "sk-test".into())
            .unwrap();
        let body = provider.request_body("compare these");
        assert_eq!(body["model"], "gpt-4.1-mini");
        let temperature = body["temperature"].as_f64().unwrap();
        assert!((temperature - 0.2).abs() < 1e-6);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "compare these");
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn test_parse_text_response() {
        let body = json!({
            "id": "chatcmpl-123",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "{\"rows\": []}" },
                "finish_reason": "stop"
            }],
            "model": "gpt-4.1-mini"
        });
        let content = OpenAiCompatibleProvider::parse_response(&body).unwrap();
        assert_eq!(content, "{\"rows\": []}");
    }

    #[test]
    fn test_parse_response_no_choices() {
        let body = json!({"choices": []});
        let err = OpenAiCompatibleProvider::parse_response(&body).unwrap_err();
        assert!(matches!(err, LlmError::ResponseParse { .. }));
    }

    #[test]
    fn test_parse_response_null_content() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": null}}]});
        assert!(OpenAiCompatibleProvider::parse_response(&body).is_err());
    }

    #[test]
    fn test_new_missing_key() {
        let err = OpenAiCompatibleProvider::new(&test_config()).unwrap_err();
        match err {
            ServiceError::MissingCredential { var } => {
                assert_eq!(var, "SIDEBYSIDE_TEST_OPENAI_KEY_UNSET");
            }
            other => panic!("Expected MissingCredential, got {:?}", other),
        }
    }

    #[test]
    fn test_new_with_inline_key() {
        let mut config = test_config();
        config.api_key = Some("sk-inline".into());
        let provider = OpenAiCompatibleProvider::new(&config).unwrap();
        assert_eq!(provider.model_name(), "gpt-4.1-mini");
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_custom_base_url_trailing_slash() {
        let mut config = test_config();
        config.base_url = Some("http://localhost:11434/v1/".into());
        let provider = OpenAiCompatibleProvider::new_with_key(&config, "ollama".into()).unwrap();
        assert_eq!(provider.base_url, "http://localhost:11434/v1");
    }

    #[test]
    fn test_debug_hides_api_key() {
        let provider = OpenAiCompatibleProvider::new_with_key(&test_config(), "sk-secret".into())
            .unwrap();
        assert!(!format!("{:?}", provider).contains("sk-secret"));
    }
}

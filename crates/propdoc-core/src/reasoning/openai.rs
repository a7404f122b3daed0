//! OpenAI-compatible chat completions client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{ChatMessage, ReasoningService};
use crate::error::ReasoningError;
use crate::models::config::ReasoningConfig;

/// Chat completions over HTTP. Holds no per-request state.
pub struct OpenAiService {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

impl OpenAiService {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ReasoningError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Build from configuration, reading the API key from the configured
    /// environment variable.
    pub fn from_config(config: &ReasoningConfig) -> Result<Self, ReasoningError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ReasoningError::MissingApiKey(config.api_key_env.clone()))?;

        Self::new(
            &config.base_url,
            &config.model,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ReasoningService for OpenAiService {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ReasoningError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature: 0.0,
        };

        debug!("POST {} ({} messages, model {})", url, messages.len(), self.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Reasoning service returned {}", status);
            return Err(ReasoningError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ReasoningError::InvalidResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ReasoningError::InvalidResponse("reply carried no content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_shape() {
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("doc")];
        let request = CompletionRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            temperature: 0.0,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "doc"}
                ],
                "temperature": 0.0
            })
        );
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"{}"}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("{}"));
    }

    #[test]
    fn test_missing_api_key() {
        let config = ReasoningConfig {
            api_key_env: "PROPDOC_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..ReasoningConfig::default()
        };
        assert!(matches!(
            OpenAiService::from_config(&config),
            Err(ReasoningError::MissingApiKey(name)) if name == "PROPDOC_TEST_KEY_THAT_IS_NEVER_SET"
        ));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let service =
            OpenAiService::new("http://localhost:8080/v1/", "m", "k", Duration::from_secs(1)).unwrap();
        assert_eq!(service.base_url, "http://localhost:8080/v1");
        assert_eq!(service.model(), "m");
    }
}

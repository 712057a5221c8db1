//! Classification boundary
//!
//! A [`Classifier`] turns a rendered prompt into the raw JSON text the model
//! returned. Validation of that text belongs to the engine.

use async_trait::async_trait;
use leadboard_common::config::ClassifierConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("leadboard/", env!("CARGO_PKG_VERSION"));

/// Classifier errors
#[derive(Debug, Error)]
pub enum ClassificationError {
    /// No API key configured
    #[error("Classifier not configured")]
    NotConfigured,

    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// Service returned a non-success status
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Response body was not the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Content parsed but failed validation
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Send `prompt`, return the model's message content
    async fn classify(&self, prompt: &str) -> Result<String, ClassificationError>;
}

/// Installed when no API key is configured; always fails
#[derive(Debug, Default)]
pub struct DisabledClassifier;

#[async_trait]
impl Classifier for DisabledClassifier {
    async fn classify(&self, _prompt: &str) -> Result<String, ClassificationError> {
        Err(ClassificationError::NotConfigured)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat-completions client
pub struct OpenAiClassifier {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, ClassificationError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ClassificationError::NotConfigured)?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClassificationError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/v1/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Classifier for OpenAiClassifier {
    async fn classify(&self, prompt: &str) -> Result<String, ClassificationError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: self.temperature,
        };

        tracing::debug!(model = %self.model, url = %self.endpoint, "Requesting classification");

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClassificationError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ClassificationError::Api(status.as_u16(), error_text));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClassificationError::Parse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ClassificationError::InvalidResponse("empty completion".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_api_key() {
        let config = ClassifierConfig::default();
        assert!(matches!(
            OpenAiClassifier::new(&config),
            Err(ClassificationError::NotConfigured)
        ));
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let config = ClassifierConfig {
            api_key: Some("sk-test".to_string()),
            base_url: "http://localhost:8080/".to_string(),
            ..Default::default()
        };
        let classifier = OpenAiClassifier::new(&config).unwrap();
        assert_eq!(classifier.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_request_body_shape() {
        let request = ChatRequest {
            model: "gpt-4o",
            messages: [ChatMessage {
                role: "user",
                content: "rate this",
            }],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: 0.3,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["model"], "gpt-4o");
    }

    #[tokio::test]
    async fn test_disabled_classifier_fails() {
        let result = DisabledClassifier.classify("anything").await;
        assert!(matches!(result, Err(ClassificationError::NotConfigured)));
    }
}

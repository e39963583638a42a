//! LLM Provider abstraction and implementations

mod gemini;
mod openai;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

use crate::ProviderConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Errors that can occur when interacting with an LLM provider
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[source] reqwest::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    ProviderError(String),

    #[error("Unsupported provider type: {0}")]
    UnsupportedProvider(String),
}

impl From<reqwest::Error> for ProviderError {
    /// Transport errors never carry the request URL
    fn from(e: reqwest::Error) -> Self {
        ProviderError::HttpError(e.without_url())
    }
}

/// Request to send to an LLM
#[derive(Debug, Clone, Serialize)]
pub struct LlmRequest {
    /// System prompt
    pub system: String,

    /// User message/prompt
    pub prompt: String,

    /// Temperature (0.0 - 1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }
}

/// Response from an LLM
#[derive(Debug, Clone, Deserialize)]
pub struct LlmResponse {
    /// The generated text
    pub content: String,

    /// Token usage statistics
    pub usage: Option<TokenUsage>,

    /// Time taken for generation (ms)
    pub duration_ms: Option<u64>,
}

/// Token usage statistics
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Result of a credential round trip
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    pub latency_ms: Option<u64>,
    pub reply: Option<String>,
    pub error: Option<String>,
}

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name for logging/identification
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;

    /// Send a completion request to the LLM
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, ProviderError>;

    /// Confirm credentials with one trivial completion
    async fn health_check(&self) -> HealthStatus {
        let request = LlmRequest::new("", "Reply with the single word: ok").with_max_tokens(8);
        let start = Instant::now();

        match self.complete(&request).await {
            Ok(response) => HealthStatus {
                healthy: true,
                latency_ms: Some(start.elapsed().as_millis() as u64),
                reply: Some(response.content.trim().to_string()),
                error: None,
            },
            Err(e) => HealthStatus {
                healthy: false,
                latency_ms: None,
                reply: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Build the provider named by the configuration
pub fn from_config(
    config: &ProviderConfig,
    api_key: &str,
) -> Result<Arc<dyn LlmProvider>, ProviderError> {
    match config.provider_type.to_lowercase().as_str() {
        "gemini" => {
            let mut provider = GeminiProvider::with_model(api_key, &config.model);
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url);
            }
            Ok(Arc::new(provider))
        }
        "openai" => {
            let base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| openai::DEFAULT_BASE_URL.to_string());
            Ok(Arc::new(OpenAiProvider::with_base_url(
                base_url,
                api_key,
                &config.model,
            )))
        }
        other => Err(ProviderError::UnsupportedProvider(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl LlmProvider for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo-1"
        }

        async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, ProviderError> {
            if request.prompt.is_empty() {
                return Err(ProviderError::ProviderError("API key not valid".to_string()));
            }
            Ok(LlmResponse {
                content: " ok \n".to_string(),
                usage: None,
                duration_ms: None,
            })
        }
    }

    #[tokio::test]
    async fn test_default_health_check_round_trip() {
        let status = Echo.health_check().await;
        assert!(status.healthy);
        assert_eq!(status.reply.as_deref(), Some("ok"));
    }

    #[test]
    fn test_from_config() {
        let mut config = ProviderConfig::default();
        config.model = "gemini-1.5-pro".to_string();
        let provider = from_config(&config, "key").unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.model(), "gemini-1.5-pro");

        config.provider_type = "OpenAI".to_string();
        config.model = "gpt-4o-mini".to_string();
        assert_eq!(from_config(&config, "key").unwrap().name(), "openai");

        config.provider_type = "carrier-pigeon".to_string();
        assert!(matches!(
            from_config(&config, "key"),
            Err(ProviderError::UnsupportedProvider(_))
        ));
    }

    #[test]
    fn test_request_builder() {
        let request = LlmRequest::new("sys", "prompt")
            .with_temperature(0.2)
            .with_max_tokens(64);
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(64));
    }
}

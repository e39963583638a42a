//! Coding Coach - problem-page scraping, prompt shaping and a model relay
//!
//! This crate provides:
//! - A page scraper and code detector that work on HTML snapshots of problem pages
//! - Prompt templates for approach review, code review and chat follow-ups
//! - Model provider backends (Gemini, OpenAI-compatible)
//! - A REST relay that forwards prompts to the model and extracts Big-O metrics
//! - A panel controller that drives any host UI and falls back to canned replies offline

pub mod api;
pub mod bridge;
pub mod complexity;
pub mod controller;
pub mod conversation;
pub mod editor;
pub mod page;
pub mod problem;
pub mod prompt;
pub mod provider;

pub use complexity::{extract_complexity, ComplexityEstimate};
pub use controller::{Controller, Mode, Panel, PanelState, SubmitOutcome};
pub use conversation::{ConversationEntry, ConversationLog, Sender};
pub use page::{PageScraper, PageSnapshot};
pub use problem::ProblemContext;
pub use prompt::{build_prompt, InteractionRequest};
pub use provider::{LlmProvider, LlmRequest, LlmResponse};

use page::SelectorConfig;
use std::path::Path;
use thiserror::Error;

/// Errors while loading the relay configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for the relay server
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RelayConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Maximum tracing level: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Model provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Documented upstream rate limits (reported, not enforced)
    #[serde(default)]
    pub limits: RateLimits,

    /// Selector overrides for the page scraper
    #[serde(default)]
    pub selectors: SelectorConfig,
}

fn default_bind_addr() -> String { "0.0.0.0:3000".to_string() }
fn default_log_level() -> String { "info".to_string() }

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            log_level: default_log_level(),
            provider: ProviderConfig::default(),
            limits: RateLimits::default(),
            selectors: SelectorConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Resolve the provider credential: config first, then the provider's environment variable
    pub fn resolve_api_key(&self) -> Option<String> {
        let non_blank = |key: &String| !key.trim().is_empty();
        self.provider
            .api_key
            .clone()
            .filter(non_blank)
            .or_else(|| std::env::var(self.provider.api_key_env()).ok().filter(non_blank))
    }
}

/// Configuration for the model provider
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ProviderConfig {
    /// Provider type: "gemini" or "openai"
    #[serde(default = "default_provider_type")]
    pub provider_type: String,

    /// Base URL override for the provider API
    #[serde(default)]
    pub base_url: Option<String>,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API key (falls back to the environment)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_provider_type() -> String { "gemini".to_string() }
fn default_model() -> String {
    std::env::var("COACH_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string())
}
fn default_temperature() -> f32 { 0.7 }
fn default_max_tokens() -> u32 { 1024 }

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            base_url: None,
            model: default_model(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl ProviderConfig {
    /// Environment variable holding the credential for this provider type
    pub fn api_key_env(&self) -> &'static str {
        match self.provider_type.to_lowercase().as_str() {
            "openai" => "OPENAI_API_KEY",
            _ => "GEMINI_API_KEY",
        }
    }
}

/// Upstream rate limits reported by `/limits`
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct RateLimits {
    #[serde(default = "default_per_minute")]
    pub requests_per_minute: u32,

    #[serde(default = "default_per_day")]
    pub requests_per_day: u32,
}

fn default_per_minute() -> u32 { 15 }
fn default_per_day() -> u32 { 1500 }

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            requests_per_minute: default_per_minute(),
            requests_per_day: default_per_day(),
        }
    }
}

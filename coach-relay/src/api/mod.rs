//! REST relay between coach hosts and the model provider
//!
//! Stateless: each `/analyze` call renders the prompt server-side, makes exactly one
//! provider call and returns the raw reply with the extracted complexity. Upstream failures
//! are classified by message into credential, rate-limit and generic errors.

use crate::complexity::{extract_complexity, ComplexityEstimate};
use crate::prompt::{build_prompt, InteractionRequest, SYSTEM_PROMPT};
use crate::provider::{LlmProvider, LlmRequest};
use crate::RateLimits;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Service name reported by `/health`
pub const SERVICE_NAME: &str = "coach-relay";

/// Remediation shown when the provider rejects the credential
pub const API_KEY_MESSAGE: &str =
    "The model provider rejected the API key. Check the relay's API key configuration and restart it.";
/// Shown when the provider quota is exhausted
pub const RATE_LIMIT_MESSAGE: &str =
    "The model provider's rate limit was reached. Wait a minute before sending another request.";
/// Coaching line returned with rate-limit errors
pub const RATE_LIMIT_FALLBACK: &str = "While the coach catches its breath, restate the problem in \
your own words and list the inputs that could break your approach.";
/// Coaching line returned with generic errors
pub const GENERIC_FALLBACK: &str = "The coach is unavailable right now. Walk through your solution \
by hand on the first example and check each step against the expected output.";

/// API state
pub struct ApiState {
    pub provider: Arc<dyn LlmProvider>,
    pub limits: RateLimits,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ApiState {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            limits: RateLimits::default(),
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

/// Successful analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub response: String,
    pub complexity: ComplexityEstimate,
    pub model: String,
    pub timestamp: DateTime<Utc>,
}

/// Error body for every failing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub model: String,
    pub timestamp: DateTime<Utc>,
}

/// Credential round-trip response
#[derive(Debug, Serialize, Deserialize)]
pub struct TestResponse {
    pub success: bool,
    pub model: String,
    pub reply: String,
    pub latency_ms: Option<u64>,
}

/// Documented rate limits
#[derive(Debug, Serialize, Deserialize)]
pub struct LimitsResponse {
    pub requests_per_minute: u32,
    pub requests_per_day: u32,
    pub note: String,
}

/// Create the API router
pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/test", get(test_provider))
        .route("/limits", get(limits))
        .route("/analyze", post(analyze))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Map an upstream failure message onto a status code and user-facing body
pub fn classify_failure(message: &str) -> (StatusCode, ErrorResponse) {
    let lower = message.to_lowercase();
    if lower.contains("api key") {
        (
            StatusCode::UNAUTHORIZED,
            ErrorResponse {
                error: "Invalid API key".to_string(),
                message: API_KEY_MESSAGE.to_string(),
                fallback: None,
            },
        )
    } else if lower.contains("quota") {
        (
            StatusCode::TOO_MANY_REQUESTS,
            ErrorResponse {
                error: "Rate limit exceeded".to_string(),
                message: RATE_LIMIT_MESSAGE.to_string(),
                fallback: Some(RATE_LIMIT_FALLBACK.to_string()),
            },
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse {
                error: "Analysis failed".to_string(),
                message: message.to_string(),
                fallback: Some(GENERIC_FALLBACK.to_string()),
            },
        )
    }
}

fn failure(message: &str) -> ApiError {
    let (status, body) = classify_failure(message);
    (status, Json(body))
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.provider.model().to_string(),
        timestamp: Utc::now(),
    })
}

/// One trivial round trip to confirm the credential works
async fn test_provider(State(state): State<Arc<ApiState>>) -> Result<Json<TestResponse>, ApiError> {
    let status = state.provider.health_check().await;
    if status.healthy {
        Ok(Json(TestResponse {
            success: true,
            model: state.provider.model().to_string(),
            reply: status.reply.unwrap_or_default(),
            latency_ms: status.latency_ms,
        }))
    } else {
        let message = status.error.unwrap_or_else(|| "Unknown provider failure".to_string());
        warn!(provider = state.provider.name(), error = %message, "Provider test failed");
        Err(failure(&message))
    }
}

/// Documented limits (informational, not enforced here)
async fn limits(State(state): State<Arc<ApiState>>) -> Json<LimitsResponse> {
    Json(LimitsResponse {
        requests_per_minute: state.limits.requests_per_minute,
        requests_per_day: state.limits.requests_per_day,
        note: "Documented provider free-tier limits; this relay does not enforce them.".to_string(),
    })
}

/// Render the prompt, call the model once, extract complexity
async fn analyze(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<InteractionRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    if request.user_text().trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Invalid request".to_string(),
                message: format!("The {} text is empty", request.kind()),
                fallback: None,
            }),
        ));
    }

    let prompt = build_prompt(&request);
    info!(
        kind = request.kind(),
        title = %request.problem().title,
        prompt_chars = prompt.len(),
        "Analyzing"
    );

    let llm_request = LlmRequest::new(SYSTEM_PROMPT, prompt)
        .with_temperature(state.temperature)
        .with_max_tokens(state.max_tokens);

    match state.provider.complete(&llm_request).await {
        Ok(response) => {
            let complexity = extract_complexity(&response.content);
            info!(
                kind = request.kind(),
                duration_ms = ?response.duration_ms,
                time = %complexity.time,
                space = %complexity.space,
                "Analysis complete"
            );
            Ok(Json(AnalyzeResponse {
                response: response.content,
                complexity,
                model: state.provider.model().to_string(),
                timestamp: Utc::now(),
            }))
        }
        Err(e) => {
            warn!(kind = request.kind(), error = %e, "Upstream model call failed");
            Err(failure(&e.to_string()))
        }
    }
}

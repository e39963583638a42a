//! End-to-end: real router on an ephemeral port, driven through RelayClient and Controller

use async_trait::async_trait;
use coach::api::{create_router, ApiState, GENERIC_FALLBACK, RATE_LIMIT_FALLBACK};
use coach::complexity::ComplexityEstimate;
use coach::controller::{
    canned_response, Analyzer, Controller, Mode, NoticeLevel, Panel, RelayClient,
    RelayClientError, SubmitOutcome,
};
use coach::conversation::{ConversationEntry, MemoryStore};
use coach::prompt::{InteractionRequest, NO_SOLUTION_INSTRUCTION};
use coach::provider::{LlmProvider, LlmRequest, LlmResponse, ProviderError};
use coach::ProblemContext;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct ScriptedModel {
    result: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl LlmProvider for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, ProviderError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        match &self.result {
            Ok(text) => Ok(LlmResponse {
                content: text.clone(),
                usage: None,
                duration_ms: Some(3),
            }),
            Err(message) => Err(ProviderError::ProviderError(message.clone())),
        }
    }
}

/// Start a relay backed by a scripted model and return its base URL
async fn spawn_relay(result: Result<&str, &str>) -> (String, Arc<ScriptedModel>) {
    let model = Arc::new(ScriptedModel {
        result: result.map(str::to_string).map_err(str::to_string),
        prompts: Mutex::new(Vec::new()),
    });
    let app = create_router(Arc::new(ApiState::new(model.clone())));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), model)
}

#[derive(Default)]
struct QuietPanel {
    notices: Vec<(NoticeLevel, String)>,
    complexity: Option<ComplexityEstimate>,
}

impl Panel for QuietPanel {
    fn set_mode(&mut self, _mode: Mode) {}

    fn set_busy(&mut self, _busy: bool) {}

    fn show_notice(&mut self, level: NoticeLevel, text: &str) {
        self.notices.push((level, text.to_string()));
    }

    fn append_entry(&mut self, _entry: &ConversationEntry) {}

    fn show_complexity(&mut self, complexity: &ComplexityEstimate) {
        self.complexity = Some(complexity.clone());
    }

    fn reset(&mut self) {}
}

fn two_sum() -> ProblemContext {
    ProblemContext {
        title: "Two Sum".to_string(),
        description: "Return indices of the two numbers that add up to target.".to_string(),
        source_url: "https://example.test/problems/two-sum".to_string(),
        ..ProblemContext::default()
    }
}

#[tokio::test]
async fn test_live_analysis_through_relay() {
    let (url, model) = spawn_relay(Ok(
        "Logic Flow: a single pass.\n**Time Complexity:** O(n)\n**Space Complexity:** O(n)",
    ))
    .await;
    let client = RelayClient::new(&url);
    assert!(client.probe().await);

    let mut controller = Controller::new(client, QuietPanel::default(), MemoryStore::new(), two_sum());
    controller.set_mode(Mode::Code);
    let outcome = controller.submit("def two_sum(nums, target): ...").await;

    assert_eq!(outcome, SubmitOutcome::Live);
    let complexity = controller.panel().complexity.clone().unwrap();
    assert_eq!(complexity.time, "O(n)");
    assert_eq!(complexity.space, "O(n)");
    assert_eq!(controller.log().len(), 2);

    let prompts = model.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Two Sum"));
    assert!(prompts[0].contains(NO_SOLUTION_INSTRUCTION));
}

#[tokio::test]
async fn test_quota_error_returns_fallback_line() {
    let (url, _) = spawn_relay(Err("You exceeded your current quota")).await;
    let client = RelayClient::new(&url);

    let request = InteractionRequest::Approach {
        problem: two_sum(),
        approach: "brute force".to_string(),
    };
    match client.analyze(&request).await {
        Err(RelayClientError::Rejected { status, body }) => {
            assert_eq!(status, 429);
            assert_eq!(body.fallback.as_deref(), Some(RATE_LIMIT_FALLBACK));
        }
        other => panic!("expected a rejection, got {other:?}"),
    }

    let mut controller = Controller::new(client, QuietPanel::default(), MemoryStore::new(), two_sum());
    assert_eq!(controller.submit("brute force").await, SubmitOutcome::Fallback);
    assert_eq!(controller.log().entries()[1].message, RATE_LIMIT_FALLBACK);
}

#[tokio::test]
async fn test_generic_error_carries_upstream_text() {
    let (url, _) = spawn_relay(Err("HTTP 503: model overloaded")).await;
    let mut controller = Controller::new(
        RelayClient::new(&url),
        QuietPanel::default(),
        MemoryStore::new(),
        two_sum(),
    );

    assert_eq!(controller.submit("hash map").await, SubmitOutcome::Fallback);
    assert_eq!(controller.log().entries()[1].message, GENERIC_FALLBACK);
    assert_eq!(
        controller.panel().notices[0],
        (NoticeLevel::Error, "HTTP 503: model overloaded".to_string())
    );
}

#[tokio::test]
async fn test_empty_submission_rejected_by_relay() {
    let (url, model) = spawn_relay(Ok("unused")).await;
    let request = InteractionRequest::Chat {
        problem: two_sum(),
        message: "  ".to_string(),
        history: Vec::new(),
    };

    match RelayClient::new(&url).analyze(&request).await {
        Err(RelayClientError::Rejected { status, body }) => {
            assert_eq!(status, 400);
            assert_eq!(body.error, "Invalid request");
        }
        other => panic!("expected a rejection, got {other:?}"),
    }
    assert!(model.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_relay_answers_offline() {
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = RelayClient::new(format!("http://{addr}"));
    assert!(!client.probe().await);

    let mut controller = Controller::new(client, QuietPanel::default(), MemoryStore::new(), two_sum());
    controller.set_mode(Mode::Chat);
    assert_eq!(controller.submit("what about edge cases?").await, SubmitOutcome::Fallback);
    assert_eq!(
        controller.log().entries()[1].message,
        canned_response("what about edge cases?")
    );
    assert_eq!(controller.panel().notices[0].0, NoticeLevel::Warning);
}

#[tokio::test]
async fn test_silent_relay_times_out_into_offline_answer() {
    // Accepts connections and never writes a byte
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let client = RelayClient::new(format!("http://{addr}"))
        .with_timeouts(Duration::from_millis(200), Duration::from_millis(300));
    assert!(!client.probe().await);

    let request = InteractionRequest::Approach {
        problem: two_sum(),
        approach: "sliding window".to_string(),
    };
    assert!(matches!(
        client.analyze(&request).await,
        Err(RelayClientError::Unreachable(_))
    ));

    let mut controller = Controller::new(client, QuietPanel::default(), MemoryStore::new(), two_sum());
    let started = std::time::Instant::now();
    assert_eq!(controller.submit("sliding window").await, SubmitOutcome::Fallback);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(
        controller.log().entries()[1].message,
        canned_response("sliding window")
    );
    assert_eq!(controller.panel().notices[0].0, NoticeLevel::Warning);
}

//! Panel/chat controller
//!
//! One controller per problem page. It owns the conversation, drives a host-provided
//! [`Panel`], and sends each submission through an [`Analyzer`] (normally the relay). When
//! the relay cannot be reached it answers from a small set of canned replies instead.
//!
//! States: `Idle` -> `AwaitingResponse` (on submit) -> `Responded`; `clear` and `navigate`
//! return to `Idle`.

mod client;
mod fallback;

pub use client::{RelayClient, RelayClientError, ANALYZE_TIMEOUT, PROBE_TIMEOUT};
pub use fallback::canned_response;

use crate::api::AnalyzeResponse;
use crate::complexity::ComplexityEstimate;
use crate::conversation::{ConversationEntry, ConversationLog, HistoryStore};
use crate::problem::ProblemContext;
use crate::prompt::{InteractionRequest, HISTORY_WINDOW};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Sends interaction requests somewhere that can answer them
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, request: &InteractionRequest)
        -> Result<AnalyzeResponse, RelayClientError>;
}

/// Severity of a transient notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Render/update interface implemented by the host UI
pub trait Panel {
    /// Show which input mode is active
    fn set_mode(&mut self, mode: Mode);

    /// Disable the trigger control and show progress while a request is in flight
    fn set_busy(&mut self, busy: bool);

    /// Show a transient notice
    fn show_notice(&mut self, level: NoticeLevel, text: &str);

    /// Render a conversation entry
    fn append_entry(&mut self, entry: &ConversationEntry);

    /// Update the complexity display
    fn show_complexity(&mut self, complexity: &ComplexityEstimate);

    /// Remove all rendered entries
    fn reset(&mut self);

    /// Remove the panel from the page
    fn close(&mut self) {}
}

/// Input mode of the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Approach,
    Code,
    Chat,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Approach => "approach",
            Mode::Code => "code",
            Mode::Chat => "chat",
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "approach" => Ok(Mode::Approach),
            "code" => Ok(Mode::Code),
            "chat" => Ok(Mode::Chat),
            other => Err(format!("Unknown mode '{other}' (expected approach, code or chat)")),
        }
    }
}

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Idle,
    AwaitingResponse,
    Responded,
}

/// How a submission was answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Empty input, nothing sent
    Rejected,
    /// Answered by the model
    Live,
    /// Answered by a canned line (local or relay-provided)
    Fallback,
    /// The relay refused with a message and no fallback line
    Failed,
}

/// Panel controller for one problem page
pub struct Controller<A: Analyzer, P: Panel, S: HistoryStore> {
    analyzer: A,
    panel: P,
    store: S,
    context: ProblemContext,
    log: ConversationLog,
    state: PanelState,
    mode: Mode,
}

impl<A: Analyzer, P: Panel, S: HistoryStore> Controller<A, P, S> {
    /// Create the controller and render any history persisted for this page
    pub fn new(analyzer: A, panel: P, store: S, context: ProblemContext) -> Self {
        let mut controller = Self {
            analyzer,
            panel,
            store,
            log: ConversationLog::new(&context.source_url),
            context,
            state: PanelState::Idle,
            mode: Mode::Approach,
        };
        controller.load_history();
        controller.panel.set_mode(controller.mode);
        controller
    }

    pub fn context(&self) -> &ProblemContext {
        &self.context
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.panel.set_mode(mode);
    }

    /// Switch to a new problem page: replace the context and reload its history
    pub fn navigate(&mut self, context: ProblemContext) {
        info!(url = %context.source_url, "Navigated to new problem");
        self.context = context;
        self.state = PanelState::Idle;
        self.panel.reset();
        self.load_history();
    }

    /// Submit user input in the current mode
    pub async fn submit(&mut self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            self.panel.show_notice(
                NoticeLevel::Warning,
                &format!("Enter your {} before submitting.", self.input_noun()),
            );
            return SubmitOutcome::Rejected;
        }

        self.state = PanelState::AwaitingResponse;
        self.panel.set_busy(true);

        let request = self.request_for(text);
        let (reply, outcome) = match self.analyzer.analyze(&request).await {
            Ok(response) => {
                debug!(model = %response.model, "Live response received");
                (Some((response.response, Some(response.complexity))), SubmitOutcome::Live)
            }
            Err(RelayClientError::Rejected { status, body }) => {
                warn!(status, error = %body.error, "Relay rejected the request");
                self.panel.show_notice(NoticeLevel::Error, &body.message);
                match body.fallback {
                    Some(line) => (Some((line, None)), SubmitOutcome::Fallback),
                    None => (None, SubmitOutcome::Failed),
                }
            }
            Err(e) => {
                warn!(error = %e, "Relay unavailable, answering offline");
                self.panel.show_notice(
                    NoticeLevel::Warning,
                    "Coach service unreachable. Showing an offline hint.",
                );
                (
                    Some((canned_response(text).to_string(), None)),
                    SubmitOutcome::Fallback,
                )
            }
        };

        self.panel.set_busy(false);
        self.state = PanelState::Responded;

        self.record(ConversationEntry::user(text));
        if let Some((message, complexity)) = reply {
            if let Some(complexity) = complexity.as_ref().filter(|c| c.is_known()) {
                self.panel.show_complexity(complexity);
            }
            self.record(ConversationEntry::assistant(message, complexity));
        }
        self.store.save_quietly(&self.log.to_record());

        outcome
    }

    /// Drop the conversation, in memory and persisted
    pub fn clear(&mut self) {
        self.log.clear();
        self.store.clear_quietly();
        self.panel.reset();
        self.state = PanelState::Idle;
    }

    /// Tear down the panel and hand back the collaborators
    pub fn destroy(mut self) -> (A, P, S) {
        self.panel.close();
        (self.analyzer, self.panel, self.store)
    }

    fn input_noun(&self) -> &'static str {
        match self.mode {
            Mode::Approach => "approach",
            Mode::Code => "code",
            Mode::Chat => "message",
        }
    }

    fn request_for(&self, text: &str) -> InteractionRequest {
        let problem = self.context.clone();
        match self.mode {
            Mode::Approach => InteractionRequest::Approach {
                problem,
                approach: text.to_string(),
            },
            Mode::Code => InteractionRequest::Code {
                problem,
                code: text.to_string(),
            },
            Mode::Chat => InteractionRequest::Chat {
                problem,
                message: text.to_string(),
                history: self.log.recent(HISTORY_WINDOW).to_vec(),
            },
        }
    }

    fn record(&mut self, entry: ConversationEntry) {
        self.panel.append_entry(&entry);
        self.log.push(entry);
    }

    fn load_history(&mut self) {
        let record = self.store.load().unwrap_or_else(|e| {
            warn!(error = %e, "Could not load conversation history");
            None
        });
        self.log = ConversationLog::restore(&self.context.source_url, record);
        for entry in self.log.entries() {
            self.panel.append_entry(entry);
        }
    }
}

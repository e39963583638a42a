//! Extension messaging between the scraping layer and the UI layer
//!
//! Two synchronous requests cross the boundary, tagged by `action`:
//!
//! ```json
//! {"action": "getProblemContext"}   ->  {"problem": {...}, "code": "..."}
//! {"action": "getCode"}             ->  {"code": "..."}
//! ```
//!
//! The content side owns a [`ContentBridge`], which holds the scraped context for the current
//! page and re-detects code when the page mutates.

use crate::editor::CodeDetector;
use crate::page::{PageScraper, PageSnapshot};
use crate::problem::ProblemContext;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Request sent from the UI layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ExtensionRequest {
    GetProblemContext,
    GetCode,
}

/// Reply from the content layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtensionResponse {
    Problem { problem: ProblemContext, code: String },
    Code { code: String },
}

impl ExtensionResponse {
    pub fn code(&self) -> &str {
        match self {
            ExtensionResponse::Problem { code, .. } | ExtensionResponse::Code { code } => code,
        }
    }
}

/// What a page mutation amounted to
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    /// Nothing the UI cares about changed
    Unchanged,
    /// The user's code changed
    CodeChanged(String),
    /// The page now shows a different problem
    Navigated(ProblemContext),
}

/// Content-side state for one tab
pub struct ContentBridge {
    scraper: PageScraper,
    detector: CodeDetector,
    context: ProblemContext,
}

impl ContentBridge {
    /// Scrape `page` and prime the code detector
    pub fn load(scraper: PageScraper, page: &PageSnapshot) -> Self {
        let context = scraper.extract(page);
        let mut detector = CodeDetector::new();
        detector.detect(page);
        info!(title = %context.title, url = %context.source_url, "Problem page loaded");
        Self {
            scraper,
            detector,
            context,
        }
    }

    pub fn context(&self) -> &ProblemContext {
        &self.context
    }

    /// Answer a request against the current state of `page`
    pub fn handle(&mut self, request: &ExtensionRequest, page: &PageSnapshot) -> ExtensionResponse {
        debug!(?request, "Extension request");
        let code = self.detector.detect(page);
        match request {
            ExtensionRequest::GetProblemContext => ExtensionResponse::Problem {
                problem: self.context.clone(),
                code,
            },
            ExtensionRequest::GetCode => ExtensionResponse::Code { code },
        }
    }

    /// Answer a raw JSON message
    pub fn handle_json(
        &mut self,
        message: &str,
        page: &PageSnapshot,
    ) -> Result<String, serde_json::Error> {
        let request: ExtensionRequest = serde_json::from_str(message)?;
        serde_json::to_string(&self.handle(&request, page))
    }

    /// Mutation observer callback. A URL change re-scrapes the page and resets the detector;
    /// otherwise code is re-detected only if the page changed.
    pub fn on_mutation(&mut self, page: &PageSnapshot) -> PageEvent {
        if page.url != self.context.source_url {
            self.navigate(page);
            return PageEvent::Navigated(self.context.clone());
        }

        if self.detector.observe(page) {
            PageEvent::CodeChanged(self.detector.cached())
        } else {
            PageEvent::Unchanged
        }
    }

    /// Replace the context wholesale with one scraped from `page`
    pub fn navigate(&mut self, page: &PageSnapshot) {
        self.context = self.scraper.extract(page);
        self.detector.reset();
        self.detector.detect(page);
        info!(title = %self.context.title, url = %self.context.source_url, "Navigated");
    }
}

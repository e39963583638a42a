//! Code detection for in-page editors
//!
//! Editors render differently (structured APIs, virtualized line lists, plain inputs), so no
//! single lookup is reliable. Detection runs an ordered chain of probes and the first one that
//! yields code wins:
//!
//! | Order | Probe | Source |
//! |-------|-------|--------|
//! | 1 | `editor_api` | Documents exposed by the page's editor API |
//! | 2 | `rendered_lines` | Visible `.view-line` nodes of a virtualized editor |
//! | 3 | `selectors` | CodeMirror 5/6, Ace, then plain textareas |
//! | 4 | `pattern_sniff` | Any textarea whose content reads like code |
//!
//! When every probe misses, the last detected code is reused, then a sentinel.

mod probes;

pub use probes::{EditorApiProbe, PatternSniffProbe, RenderedLinesProbe, SelectorProbe};

use crate::page::PageSnapshot;
use scraper::Html;
use tracing::debug;

/// Returned when no probe finds code and nothing was detected before
pub const NO_CODE_DETECTED: &str = "// No code detected";

/// A single strategy for locating the user's code
pub trait CodeProbe: Send + Sync {
    /// Probe identifier (e.g., "editor_api", "selectors")
    fn id(&self) -> &'static str;

    /// Attempt to read the code; `None` passes to the next probe
    fn probe(&self, page: &PageSnapshot, document: &Html) -> Option<String>;
}

/// Runs the probe chain and remembers the last result
pub struct CodeDetector {
    probes: Vec<Box<dyn CodeProbe>>,
    last_code: Option<String>,
    last_fingerprint: Option<u64>,
}

impl CodeDetector {
    /// Detector with the default probe order
    pub fn new() -> Self {
        Self::with_probes(vec![
            Box::new(EditorApiProbe),
            Box::new(RenderedLinesProbe),
            Box::new(SelectorProbe::new()),
            Box::new(PatternSniffProbe),
        ])
    }

    /// Detector with a custom probe chain
    pub fn with_probes(probes: Vec<Box<dyn CodeProbe>>) -> Self {
        Self {
            probes,
            last_code: None,
            last_fingerprint: None,
        }
    }

    /// Probe ids in evaluation order
    pub fn probe_order(&self) -> Vec<&'static str> {
        self.probes.iter().map(|p| p.id()).collect()
    }

    /// Detect the user's current code, evaluated fresh against `page`
    pub fn detect(&mut self, page: &PageSnapshot) -> String {
        let document = page.document();
        self.last_fingerprint = Some(page.fingerprint());

        for probe in &self.probes {
            if let Some(code) = probe.probe(page, &document) {
                debug!(probe = probe.id(), chars = code.len(), "Detected code");
                self.last_code = Some(code.clone());
                return code;
            }
        }

        debug!("No probe found code, using cached value");
        self.cached()
    }

    /// Mutation trigger: re-detect only when the page changed since the last look.
    /// Returns whether the detected code changed.
    pub fn observe(&mut self, page: &PageSnapshot) -> bool {
        if self.last_fingerprint == Some(page.fingerprint()) {
            return false;
        }
        let before = self.last_code.clone();
        self.detect(page);
        self.last_code != before
    }

    /// Last detected code, or the sentinel
    pub fn cached(&self) -> String {
        self.last_code
            .clone()
            .unwrap_or_else(|| NO_CODE_DETECTED.to_string())
    }

    /// Forget cached state, e.g. after navigating to another problem
    pub fn reset(&mut self) {
        self.last_code = None;
        self.last_fingerprint = None;
    }
}

impl Default for CodeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CodeDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeDetector")
            .field("probes", &self.probe_order())
            .field("has_cached_code", &self.last_code.is_some())
            .finish()
    }
}

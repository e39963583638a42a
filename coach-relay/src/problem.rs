//! Problem context scraped from a problem page

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title used when no title selector matches
pub const UNKNOWN_TITLE: &str = "Unknown Problem";

/// Maximum description length kept in a context (chars)
pub const MAX_DESCRIPTION_CHARS: usize = 3000;
/// Maximum number of examples kept
pub const MAX_EXAMPLES: usize = 3;
/// Maximum number of constraints kept
pub const MAX_CONSTRAINTS: usize = 5;

/// Snapshot of a coding problem's textual content.
///
/// Built once per page load by the scraper and replaced wholesale on navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProblemContext {
    pub title: String,
    pub description: String,
    pub examples: Vec<String>,
    pub constraints: Vec<String>,
    pub source_url: String,
    pub captured_at: DateTime<Utc>,
}

impl Default for ProblemContext {
    fn default() -> Self {
        Self {
            title: UNKNOWN_TITLE.to_string(),
            description: String::new(),
            examples: Vec::new(),
            constraints: Vec::new(),
            source_url: String::new(),
            captured_at: Utc::now(),
        }
    }
}

impl ProblemContext {
    /// Same content, ignoring when it was captured
    pub fn same_content(&self, other: &ProblemContext) -> bool {
        self.title == other.title
            && self.description == other.description
            && self.examples == other.examples
            && self.constraints == other.constraints
            && self.source_url == other.source_url
    }
}

/// Truncate `text` to at most `max` chars, returning whether anything was cut
pub(crate) fn truncate_chars(text: &str, max: usize) -> (&str, bool) {
    match text.char_indices().nth(max) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}

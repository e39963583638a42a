//! Problem-page scraping
//!
//! Pages are uncontrolled markup, so every field is read through a cascade of candidate
//! selectors and the first non-empty match wins. Examples and constraints are harvested by
//! pattern heuristics over `pre`, `li` and `p` blocks.

pub mod sanitize;

use crate::problem::{
    truncate_chars, ProblemContext, MAX_CONSTRAINTS, MAX_DESCRIPTION_CHARS, MAX_EXAMPLES,
    UNKNOWN_TITLE,
};
use chrono::Utc;
use regex::Regex;
use sanitize::escape_html;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, warn};

/// Title used when extraction itself fails
pub const EXTRACTION_ERROR_TITLE: &str = "Error extracting problem";

/// Markers that identify an example block
const EXAMPLE_MARKERS: &[&str] = &["Input:", "Example", "Output:"];
/// Example blocks must be at least this long (chars)
const MIN_EXAMPLE_CHARS: usize = 10;
/// Example blocks must be shorter than this (chars)
const MAX_EXAMPLE_CHARS: usize = 500;
/// Constraint blocks longer than this are prose, not constraints (chars)
const MAX_CONSTRAINT_CHARS: usize = 200;

static COMPARISON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[<>≤≥]").expect("valid comparison regex"));
static DIGIT_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d\s*(?:\.{2,3}|…)\s*\d|10\s*\^\s*\d").expect("valid range regex")
});

/// Errors raised while scraping; callers of [`PageScraper::extract`] never see them
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// HTML snapshot of a problem page, as handed over by the host
#[derive(Debug, Clone, Default)]
pub struct PageSnapshot {
    /// URL of the page
    pub url: String,
    /// Serialized DOM
    pub html: String,
    /// Documents exposed by a structured editor API in the page, in open order
    pub editor_models: Vec<String>,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            editor_models: Vec::new(),
        }
    }

    /// Attach the documents read from the page's editor API
    pub fn with_editor_models(mut self, models: Vec<String>) -> Self {
        self.editor_models = models;
        self
    }

    /// Parse the snapshot into a DOM
    pub fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }

    /// Cheap change detector used by mutation observers
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.url.hash(&mut hasher);
        self.html.hash(&mut hasher);
        self.editor_models.hash(&mut hasher);
        hasher.finish()
    }
}

/// Candidate selectors per field, tried in order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    #[serde(default = "default_title_selectors")]
    pub title: Vec<String>,

    #[serde(default = "default_description_selectors")]
    pub description: Vec<String>,
}

fn default_title_selectors() -> Vec<String> {
    [
        r#"[data-cy="question-title"]"#,
        ".text-title-large a",
        ".text-title-large",
        ".question-title h3",
        "h1",
        "title",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_description_selectors() -> Vec<String> {
    [
        r#"[data-track-load="description_content"]"#,
        r#"[data-cy="question-content"]"#,
        ".question-content__JfgR",
        ".content__u3I1",
        r#"div[class*="description"]"#,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            title: default_title_selectors(),
            description: default_description_selectors(),
        }
    }
}

/// Scrapes a [`ProblemContext`] out of a page snapshot
#[derive(Debug, Clone, Default)]
pub struct PageScraper {
    selectors: SelectorConfig,
}

impl PageScraper {
    pub fn new(selectors: SelectorConfig) -> Self {
        Self { selectors }
    }

    /// Extract the problem context. Never fails: extraction errors produce a context
    /// holding diagnostic placeholder text.
    pub fn extract(&self, page: &PageSnapshot) -> ProblemContext {
        match self.try_extract(page) {
            Ok(context) => {
                debug!(
                    title = %context.title,
                    examples = context.examples.len(),
                    constraints = context.constraints.len(),
                    "Extracted problem context"
                );
                context
            }
            Err(e) => {
                warn!(url = %page.url, error = %e, "Problem extraction failed");
                ProblemContext {
                    title: EXTRACTION_ERROR_TITLE.to_string(),
                    description: escape_html(&format!("Could not extract problem details: {e}")),
                    source_url: page.url.clone(),
                    ..ProblemContext::default()
                }
            }
        }
    }

    /// Extract the problem context, surfacing selector errors
    pub fn try_extract(&self, page: &PageSnapshot) -> Result<ProblemContext, ScrapeError> {
        let document = page.document();

        let title = first_text(&document, &self.selectors.title)?
            .map(|t| clean_title(&t))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

        let description = first_text(&document, &self.selectors.description)?
            .map(|d| cap_escaped(&escape_html(&d), MAX_DESCRIPTION_CHARS))
            .unwrap_or_default();

        Ok(ProblemContext {
            title: escape_html(&title),
            description,
            examples: harvest_examples(&document)?,
            constraints: harvest_constraints(&document)?,
            source_url: page.url.clone(),
            captured_at: Utc::now(),
        })
    }
}

/// Cap already-escaped text to `max` chars; an entity cut at the boundary is dropped whole
fn cap_escaped(text: &str, max: usize) -> String {
    let (cut, truncated) = truncate_chars(text, max);
    if !truncated {
        return cut.to_string();
    }
    match cut.rfind('&') {
        Some(idx) if !cut[idx..].contains(';') => cut[..idx].to_string(),
        _ => cut.to_string(),
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Trimmed text of the first element matching any candidate, in candidate order
fn first_text(document: &Html, candidates: &[String]) -> Result<Option<String>, ScrapeError> {
    for candidate in candidates {
        let selector = parse_selector(candidate)?;
        let found = document
            .select(&selector)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .find(|text| !text.is_empty());
        if found.is_some() {
            return Ok(found);
        }
    }
    Ok(None)
}

fn clean_title(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .strip_suffix(" - LeetCode")
        .unwrap_or(&collapsed)
        .to_string()
}

fn harvest_examples(document: &Html) -> Result<Vec<String>, ScrapeError> {
    let selector = parse_selector("pre")?;
    Ok(document
        .select(&selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| is_example(text))
        .take(MAX_EXAMPLES)
        .map(|text| escape_html(&text))
        .collect())
}

fn is_example(text: &str) -> bool {
    let len = text.chars().count();
    (MIN_EXAMPLE_CHARS..MAX_EXAMPLE_CHARS).contains(&len)
        && EXAMPLE_MARKERS.iter().any(|marker| text.contains(marker))
}

fn harvest_constraints(document: &Html) -> Result<Vec<String>, ScrapeError> {
    let selector = parse_selector("li, p")?;
    Ok(document
        .select(&selector)
        .map(|el| {
            el.text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|text| is_constraint(text))
        .take(MAX_CONSTRAINTS)
        .map(|text| escape_html(&text))
        .collect())
}

fn is_constraint(text: &str) -> bool {
    if text.is_empty() || text.chars().count() > MAX_CONSTRAINT_CHARS || text.contains("Example")
    {
        return false;
    }
    let lower = text.to_lowercase();
    COMPARISON.is_match(text)
        || lower.contains("constraints")
        || DIGIT_RANGE.is_match(text)
        || lower.contains("length")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SUM: &str = r#"
    <html>
      <head><title>Two Sum - LeetCode</title></head>
      <body>
        <div data-cy="question-title">1. Two Sum</div>
        <div data-track-load="description_content">
          <p>Given an array of integers nums and an integer target, return indices of the two numbers.</p>
          <p><strong>Example 1:</strong></p>
          <pre>Input: nums = [2,7,11,15], target = 9
Output: [0,1]</pre>
          <pre>Input: nums = [3,2,4], target = 6
Output: [1,2]</pre>
          <pre>x</pre>
          <p><strong>Constraints:</strong></p>
          <ul>
            <li>2 &lt;= nums.length &lt;= 10<sup>4</sup></li>
            <li>-10<sup>9</sup> &lt;= nums[i] &lt;= 10<sup>9</sup></li>
            <li>Only one valid answer exists.</li>
          </ul>
        </div>
      </body>
    </html>
    "#;

    fn scrape(html: &str) -> ProblemContext {
        PageScraper::default().extract(&PageSnapshot::new("https://leetcode.com/problems/two-sum/", html))
    }

    #[test]
    fn test_extracts_title_and_description() {
        let ctx = scrape(TWO_SUM);
        assert_eq!(ctx.title, "1. Two Sum");
        assert!(ctx.description.starts_with("Given an array of integers"));
        assert_eq!(ctx.source_url, "https://leetcode.com/problems/two-sum/");
    }

    #[test]
    fn test_examples_filtered_by_marker_and_length() {
        let ctx = scrape(TWO_SUM);
        assert_eq!(ctx.examples.len(), 2);
        assert!(ctx.examples[0].starts_with("Input: nums = [2,7,11,15]"));
    }

    #[test]
    fn test_constraints_are_sanitized() {
        let ctx = scrape(TWO_SUM);
        assert!(ctx.constraints.contains(&"Constraints:".to_string()));
        assert!(ctx.constraints.contains(&"2 &lt;= nums.length &lt;= 104".to_string()));
        assert!(!ctx.constraints.iter().any(|c| c.contains("Only one valid answer")));
        assert!(!ctx.constraints.iter().any(|c| c.contains('<')));
    }

    #[test]
    fn test_caps_examples_and_constraints() {
        let mut body = String::new();
        for i in 0..6 {
            body.push_str(&format!("<pre>Input: n = {i}\nOutput: {i}</pre>"));
            body.push_str(&format!("<li>1 &lt;= k{i} &lt;= 100</li>"));
        }
        let ctx = scrape(&format!("<html><body>{body}</body></html>"));
        assert_eq!(ctx.examples.len(), MAX_EXAMPLES);
        assert_eq!(ctx.constraints.len(), MAX_CONSTRAINTS);
    }

    #[test]
    fn test_no_matches_yields_placeholders() {
        let ctx = scrape("<html><body><span>nothing here</span></body></html>");
        assert_eq!(ctx.title, UNKNOWN_TITLE);
        assert_eq!(ctx.description, "");
        assert!(ctx.examples.is_empty());
        assert!(ctx.constraints.is_empty());
    }

    #[test]
    fn test_title_falls_back_to_document_title() {
        let ctx = scrape("<html><head><title>Valid Parentheses - LeetCode</title></head><body></body></html>");
        assert_eq!(ctx.title, "Valid Parentheses");
    }

    #[test]
    fn test_long_description_is_capped() {
        let long = "a".repeat(MAX_DESCRIPTION_CHARS + 500);
        let ctx = scrape(&format!(
            r#"<html><body><div data-cy="question-content">{long}</div></body></html>"#
        ));
        assert_eq!(ctx.description.chars().count(), MAX_DESCRIPTION_CHARS);
    }

    #[test]
    fn test_escaped_description_stays_within_cap() {
        let text = format!("{}&lt;b&gt; {}", "a".repeat(MAX_DESCRIPTION_CHARS - 1), "x".repeat(50));
        let ctx = scrape(&format!(
            r#"<html><body><div data-cy="question-content">{text}</div></body></html>"#
        ));
        assert!(ctx.description.chars().count() <= MAX_DESCRIPTION_CHARS);
        assert_eq!(ctx.description, "a".repeat(MAX_DESCRIPTION_CHARS - 1));

        let ctx = scrape(r#"<html><body><div data-cy="question-content">x &lt; y</div></body></html>"#);
        assert_eq!(ctx.description, "x &lt; y");
    }

    #[test]
    fn test_cap_escaped_keeps_whole_entities() {
        assert_eq!(cap_escaped("ab&amp;cd", 4), "ab");
        assert_eq!(cap_escaped("ab&amp;cd", 7), "ab&amp;");
        assert_eq!(cap_escaped("abc", 10), "abc");
    }

    #[test]
    fn test_invalid_selector_degrades_to_placeholder() {
        let scraper = PageScraper::new(SelectorConfig {
            title: vec!["[[broken".to_string()],
            description: default_description_selectors(),
        });
        let ctx = scraper.extract(&PageSnapshot::new("https://x/p", TWO_SUM));
        assert_eq!(ctx.title, EXTRACTION_ERROR_TITLE);
        assert!(ctx.description.contains("Invalid selector"));
        assert_eq!(ctx.source_url, "https://x/p");
        assert!(scraper.try_extract(&PageSnapshot::new("https://x/p", TWO_SUM)).is_err());
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let page = PageSnapshot::new("https://leetcode.com/problems/two-sum/", TWO_SUM);
        let scraper = PageScraper::default();
        let first = scraper.extract(&page);
        let second = scraper.extract(&page);
        assert!(first.same_content(&second));
    }

    #[test]
    fn test_fingerprint_tracks_changes() {
        let a = PageSnapshot::new("u", "<p>1</p>");
        let b = PageSnapshot::new("u", "<p>2</p>");
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}

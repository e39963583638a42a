//! Editor probes, strongest signal first

use super::CodeProbe;
use crate::page::PageSnapshot;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Textareas shorter than this are not treated as code by pattern sniffing (chars)
const MIN_SNIFFED_CODE_CHARS: usize = 20;

static CODE_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:function|class|def|var|let|const|return|if|for|while)\b")
        .expect("valid keyword regex")
});

static MONACO_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".monaco-editor").expect("valid selector"));
static MONACO_LINE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".view-line").expect("valid selector"));
static TEXTAREA: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("textarea").expect("valid selector"));

/// Known editor widgets and generic inputs, in lookup order
const EDITOR_SELECTORS: &[&str] = &[
    ".CodeMirror-code",
    ".cm-content",
    ".ace_text-layer",
    r#"textarea[name="code"]"#,
    "textarea",
];

/// Value of an input-like element, or its text content
fn element_value(el: ElementRef<'_>) -> String {
    match el.value().attr("value") {
        Some(value) => value.to_string(),
        None => el.text().collect(),
    }
}

/// Reads the first document exposed by a structured editor API
pub struct EditorApiProbe;

impl CodeProbe for EditorApiProbe {
    fn id(&self) -> &'static str {
        "editor_api"
    }

    fn probe(&self, page: &PageSnapshot, _document: &Html) -> Option<String> {
        page.editor_models
            .first()
            .filter(|text| !text.trim().is_empty())
            .cloned()
    }
}

/// Joins the rendered lines of a virtualized editor
pub struct RenderedLinesProbe;

impl CodeProbe for RenderedLinesProbe {
    fn id(&self) -> &'static str {
        "rendered_lines"
    }

    fn probe(&self, _page: &PageSnapshot, document: &Html) -> Option<String> {
        document.select(&MONACO_CONTAINER).find_map(|container| {
            let lines: Vec<String> = container
                .select(&MONACO_LINE)
                .map(|line| line.text().collect::<String>().replace('\u{a0}', " "))
                .collect();
            let code = lines.join("\n");
            (!code.trim().is_empty()).then_some(code)
        })
    }
}

/// First non-empty element among known editor selectors
pub struct SelectorProbe {
    selectors: Vec<Selector>,
}

impl SelectorProbe {
    pub fn new() -> Self {
        Self {
            selectors: EDITOR_SELECTORS
                .iter()
                .filter_map(|s| Selector::parse(s).ok())
                .collect(),
        }
    }
}

impl Default for SelectorProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeProbe for SelectorProbe {
    fn id(&self) -> &'static str {
        "selectors"
    }

    fn probe(&self, _page: &PageSnapshot, document: &Html) -> Option<String> {
        self.selectors.iter().find_map(|selector| {
            document
                .select(selector)
                .next()
                .map(element_value)
                .filter(|text| !text.trim().is_empty())
        })
    }
}

/// Scans every textarea for something that reads like source code
pub struct PatternSniffProbe;

impl PatternSniffProbe {
    /// Whether `text` looks like code
    pub fn looks_like_code(text: &str) -> bool {
        text.trim().chars().count() > MIN_SNIFFED_CODE_CHARS && CODE_KEYWORDS.is_match(text)
    }
}

impl CodeProbe for PatternSniffProbe {
    fn id(&self) -> &'static str {
        "pattern_sniff"
    }

    fn probe(&self, _page: &PageSnapshot, document: &Html) -> Option<String> {
        document
            .select(&TEXTAREA)
            .map(element_value)
            .find(|text| Self::looks_like_code(text))
    }
}

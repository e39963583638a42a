//! Big-O extraction from free-text model replies
//!
//! Best effort only: when a reply mentions the complexity of a sub-step before the overall
//! algorithm, the sub-step's value is picked.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Value used when no complexity is found
pub const UNKNOWN_COMPLEXITY: &str = "O(?)";

/// `O(...)` with up to two levels of nested parentheses, e.g. `O(log(min(m, n)))`
const BIG_O: &str = r"O\((?:[^()]|\((?:[^()]|\([^()]*\))*\))*\)";

/// Time/space pair parsed from a model reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityEstimate {
    pub time: String,
    pub space: String,
}

impl ComplexityEstimate {
    /// Both fields unknown
    pub fn unknown() -> Self {
        Self {
            time: UNKNOWN_COMPLEXITY.to_string(),
            space: UNKNOWN_COMPLEXITY.to_string(),
        }
    }

    /// Whether at least one field was found
    pub fn is_known(&self) -> bool {
        self.time != UNKNOWN_COMPLEXITY || self.space != UNKNOWN_COMPLEXITY
    }
}

/// Ordered patterns for one metric ("time" or "space")
fn patterns_for(label: &str) -> Vec<Regex> {
    [
        format!(r"(?i)\b{label}\s+complexity\s*\**\s*:\s*\**\s*{BIG_O}"),
        format!(r"(?i)\b{label}\s*\**\s*:\s*\**\s*{BIG_O}"),
        format!(r"(?i){BIG_O}\s*\**\s*{label}\b"),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid complexity pattern"))
    .collect()
}

static TIME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| patterns_for("time"));
static SPACE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| patterns_for("space"));
static BIG_O_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("(?i){BIG_O}")).expect("valid big-o pattern"));

fn extract_one(text: &str, patterns: &[Regex]) -> String {
    patterns
        .iter()
        .find_map(|pattern| {
            let labeled = pattern.find(text)?;
            BIG_O_ONLY.find(labeled.as_str())
        })
        // Normalize a lowercase `o(` so the display is consistent
        .map(|o| format!("O{}", &o.as_str()[1..]))
        .unwrap_or_else(|| UNKNOWN_COMPLEXITY.to_string())
}

/// Extract the time and space complexity mentioned in `text`
pub fn extract_complexity(text: &str) -> ComplexityEstimate {
    ComplexityEstimate {
        time: extract_one(text, &TIME_PATTERNS),
        space: extract_one(text, &SPACE_PATTERNS),
    }
}

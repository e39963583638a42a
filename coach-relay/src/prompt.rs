//! Prompt templates for the three interaction kinds

use crate::conversation::{ConversationEntry, Sender};
use crate::problem::{truncate_chars, ProblemContext};
use serde::{Deserialize, Serialize};

/// Appended to every prompt
pub const NO_SOLUTION_INSTRUCTION: &str =
    "Do not reveal a full solution or write complete working code for the problem.";

/// System instruction sent alongside every prompt
pub const SYSTEM_PROMPT: &str = "You are a patient coding-interview coach. You guide \
candidates toward their own solution with questions, hints and feedback on their reasoning.";

/// Description chars embedded in the approach and code templates
pub const DESCRIPTION_LIMIT: usize = 1000;
/// Code chars embedded in the code template
pub const CODE_LIMIT: usize = 2000;
/// Marker appended to truncated code
pub const TRUNCATION_MARKER: &str = "\n...truncated";
/// History entries embedded in a chat prompt
pub const HISTORY_WINDOW: usize = 6;
/// Chars kept per history entry
pub const HISTORY_MESSAGE_LIMIT: usize = 200;

const SECTION_CONTRACT: &str = "Respond with exactly these five sections, each introduced by \
its heading on its own line:
Logic Flow:
Complexity: (state the Time Complexity and Space Complexity in Big-O notation)
Edge Cases:
Optimization:
Next Questions:
Write plain sentences. Do not use bullet points, dashes or numbered lists.";

/// One user action, tagged by `type` on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InteractionRequest {
    /// Review of a described approach
    Approach {
        problem: ProblemContext,
        approach: String,
    },
    /// Review of the user's code
    Code { problem: ProblemContext, code: String },
    /// Follow-up chat message
    Chat {
        problem: ProblemContext,
        message: String,
        #[serde(default)]
        history: Vec<ConversationEntry>,
    },
}

impl InteractionRequest {
    pub fn problem(&self) -> &ProblemContext {
        match self {
            Self::Approach { problem, .. } | Self::Code { problem, .. } | Self::Chat { problem, .. } => {
                problem
            }
        }
    }

    /// The user-authored text carried by the request
    pub fn user_text(&self) -> &str {
        match self {
            Self::Approach { approach, .. } => approach,
            Self::Code { code, .. } => code,
            Self::Chat { message, .. } => message,
        }
    }

    /// Wire name of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Approach { .. } => "approach",
            Self::Code { .. } => "code",
            Self::Chat { .. } => "chat",
        }
    }
}

/// Render the prompt for a request
pub fn build_prompt(request: &InteractionRequest) -> String {
    match request {
        InteractionRequest::Approach { problem, approach } => approach_prompt(problem, approach),
        InteractionRequest::Code { problem, code } => code_prompt(problem, code),
        InteractionRequest::Chat {
            problem,
            message,
            history,
        } => chat_prompt(problem, message, history),
    }
}

fn truncated_description(problem: &ProblemContext) -> String {
    let (head, cut) = truncate_chars(&problem.description, DESCRIPTION_LIMIT);
    if cut {
        format!("{head}...")
    } else {
        head.to_string()
    }
}

fn approach_prompt(problem: &ProblemContext, approach: &str) -> String {
    format!(
        r#"Review the candidate's approach to a coding problem.

PROBLEM: {title}
DESCRIPTION:
{description}

CANDIDATE'S APPROACH:
{approach}

{contract}
Focus on whether the reasoning holds and what it misses.
{no_solution}"#,
        title = problem.title,
        description = truncated_description(problem),
        contract = SECTION_CONTRACT,
        no_solution = NO_SOLUTION_INSTRUCTION,
    )
}

fn code_prompt(problem: &ProblemContext, code: &str) -> String {
    let (head, cut) = truncate_chars(code, CODE_LIMIT);
    let code = if cut {
        format!("{head}{TRUNCATION_MARKER}")
    } else {
        head.to_string()
    };

    let mut context = String::new();
    if !problem.examples.is_empty() {
        context.push_str("EXAMPLES:\n");
        context.push_str(&problem.examples.join("\n\n"));
        context.push_str("\n\n");
    }
    if !problem.constraints.is_empty() {
        context.push_str("CONSTRAINTS:\n");
        context.push_str(&problem.constraints.join("\n"));
        context.push_str("\n\n");
    }

    format!(
        r#"Review the candidate's code for a coding problem.

PROBLEM: {title}
DESCRIPTION:
{description}

{context}CANDIDATE'S CODE:
```
{code}
```

{contract}
Point at bugs and weak spots by describing them, not by rewriting the code.
{no_solution}"#,
        title = problem.title,
        description = truncated_description(problem),
        contract = SECTION_CONTRACT,
        no_solution = NO_SOLUTION_INSTRUCTION,
    )
}

fn history_line(entry: &ConversationEntry) -> String {
    let label = match entry.sender {
        Sender::User => "User",
        Sender::Assistant => "Assistant",
    };
    let (head, cut) = truncate_chars(&entry.message, HISTORY_MESSAGE_LIMIT);
    if cut {
        format!("{label}: {head}...")
    } else {
        format!("{label}: {head}")
    }
}

fn chat_prompt(problem: &ProblemContext, message: &str, history: &[ConversationEntry]) -> String {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let transcript = history[start..]
        .iter()
        .map(history_line)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are in an ongoing coaching conversation about the problem "{title}".

RECENT CONVERSATION:
{transcript}

NEW MESSAGE:
User: {message}

Reply conversationally in a few short paragraphs. Prefer hints and guiding questions over answers.
{no_solution}"#,
        title = problem.title,
        no_solution = NO_SOLUTION_INSTRUCTION,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem() -> ProblemContext {
        ProblemContext {
            title: "1. Two Sum".to_string(),
            description: "Given an array of integers nums and an integer target.".to_string(),
            examples: vec!["Input: nums = [2,7], target = 9\nOutput: [0,1]".to_string()],
            constraints: vec!["2 &lt;= nums.length".to_string()],
            source_url: "https://leetcode.com/problems/two-sum/".to_string(),
            ..ProblemContext::default()
        }
    }

    fn all_variants() -> Vec<InteractionRequest> {
        vec![
            InteractionRequest::Approach {
                problem: problem(),
                approach: "Use a hash map of seen values.".to_string(),
            },
            InteractionRequest::Code {
                problem: problem(),
                code: "def two_sum(nums, target): pass".to_string(),
            },
            InteractionRequest::Chat {
                problem: problem(),
                message: "Why a hash map?".to_string(),
                history: vec![ConversationEntry::user("hi")],
            },
        ]
    }

    #[test]
    fn test_every_template_has_title_and_policy() {
        for request in all_variants() {
            let prompt = build_prompt(&request);
            assert!(prompt.contains("1. Two Sum"), "{} prompt lacks title", request.kind());
            assert!(
                prompt.contains(NO_SOLUTION_INSTRUCTION),
                "{} prompt lacks policy line",
                request.kind()
            );
        }
    }

    #[test]
    fn test_review_templates_list_sections() {
        for request in all_variants().into_iter().take(2) {
            let prompt = build_prompt(&request);
            for section in ["Logic Flow", "Complexity", "Edge Cases", "Optimization", "Next Questions"] {
                assert!(prompt.contains(section));
            }
        }
    }

    #[test]
    fn test_code_truncation() {
        let code: String = (0..3000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let prompt = build_prompt(&InteractionRequest::Code {
            problem: problem(),
            code: code.clone(),
        });
        let expected = format!("{}{}", &code[..2000], TRUNCATION_MARKER);
        assert!(prompt.contains(&expected));
        assert!(!prompt.contains(&code[..2001]));
    }

    #[test]
    fn test_short_code_not_marked() {
        let prompt = build_prompt(&InteractionRequest::Code {
            problem: problem(),
            code: "return 0".to_string(),
        });
        assert!(!prompt.contains("...truncated"));
    }

    #[test]
    fn test_history_window() {
        let history: Vec<ConversationEntry> = (0..10)
            .map(|i| {
                let text = format!("message-{i:02} {}", "x".repeat(300));
                if i % 2 == 0 {
                    ConversationEntry::user(text)
                } else {
                    ConversationEntry::assistant(text, None)
                }
            })
            .collect();

        let prompt = build_prompt(&InteractionRequest::Chat {
            problem: problem(),
            message: "next?".to_string(),
            history,
        });

        for i in 0..4 {
            assert!(!prompt.contains(&format!("message-{i:02}")));
        }
        for i in 4..10 {
            assert!(prompt.contains(&format!("message-{i:02}")));
        }

        let capped = format!("message-09 {}...", "x".repeat(HISTORY_MESSAGE_LIMIT - 11));
        assert!(prompt.contains(&format!("Assistant: {capped}\n")));
        assert!(!prompt.contains(&"x".repeat(HISTORY_MESSAGE_LIMIT)));
    }

    #[test]
    fn test_wire_format() {
        let json = r#"{
            "type": "chat",
            "problem": {"title": "Two Sum", "sourceUrl": "https://x"},
            "message": "hint please",
            "history": [{"message": "hi", "sender": "user"}]
        }"#;
        let request: InteractionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.kind(), "chat");
        assert_eq!(request.user_text(), "hint please");
        assert_eq!(request.problem().title, "Two Sum");

        let value = serde_json::to_value(InteractionRequest::Code {
            problem: problem(),
            code: "x".to_string(),
        })
        .unwrap();
        assert_eq!(value["type"], "code");
        assert_eq!(value["code"], "x");
    }
}

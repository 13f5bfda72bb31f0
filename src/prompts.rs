//! Prompt construction for text-to-Markdown conversion.
//!
//! Every provider receives the same instruction string: the prompt is built
//! once per request, before the adapter is invoked, and never mentions which
//! service will read it. Keeping the wording here lets unit tests inspect the
//! exact text without a provider in the loop.
//!
//! The builder does not truncate. Callers that need an input-length cap apply
//! it beforehand (see [`crate::config::InputLimits`]).

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Fixed opening block, shared by every task.
pub const PREAMBLE: &str = "Convert the following text into a well-formatted Markdown document.

INSTRUCTIONS:
- Create a hierarchical structure with appropriate headings and subheadings
- Use correct Markdown formatting (bold, italic, lists, etc.)
- Organise the content into logical sections
- Preserve all important information
";

/// Clauses appended for [`ConversionTask::ImproveStructure`].
pub const IMPROVE_CLAUSES: &str = "- Improve the clarity and readability of the text
- Correct any grammatical errors
- Optimise the structure for better comprehension
";

/// Clauses appended for [`ConversionTask::PreserveStructureOnly`].
pub const PRESERVE_CLAUSES: &str = "- Focus mainly on structuring the content
- Keep the original wording as unchanged as possible
- Add only the Markdown formatting that is necessary
";

/// Label introducing the verbatim input.
pub const INPUT_LABEL: &str = "TEXT TO CONVERT:";

/// Emitted in place of the input when the input is the empty string.
pub const EMPTY_INPUT_MARKER: &str = "[empty input]";

/// Closing instruction; always the last line of the prompt.
pub const CLOSING_INSTRUCTION: &str =
    "OUTPUT: Return only Markdown content, with no additional commentary or explanations.";

/// What the provider is asked to do with the text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ConversionTask {
    /// Restructure and polish: clarity, grammar, better organisation. (default)
    #[default]
    ImproveStructure,
    /// Add Markdown structure while leaving the wording alone.
    PreserveStructureOnly,
    /// Any other selector. Produces the preamble without a task block.
    Unrecognized(String),
}

impl ConversionTask {
    /// The short selector name used on the command line.
    pub fn as_str(&self) -> &str {
        match self {
            ConversionTask::ImproveStructure => "improve",
            ConversionTask::PreserveStructureOnly => "structure",
            ConversionTask::Unrecognized(s) => s,
        }
    }

    fn clauses(&self) -> Option<&'static str> {
        match self {
            ConversionTask::ImproveStructure => Some(IMPROVE_CLAUSES),
            ConversionTask::PreserveStructureOnly => Some(PRESERVE_CLAUSES),
            ConversionTask::Unrecognized(_) => None,
        }
    }
}

impl FromStr for ConversionTask {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "improve" | "improve-structure" | "improveStructure" => {
                ConversionTask::ImproveStructure
            }
            "structure" | "preserve" | "preserve-structure" | "preserveStructureOnly" => {
                ConversionTask::PreserveStructureOnly
            }
            other => ConversionTask::Unrecognized(other.to_string()),
        })
    }
}

impl From<String> for ConversionTask {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(task) => task,
            Err(never) => match never {},
        }
    }
}

impl From<ConversionTask> for String {
    fn from(task: ConversionTask) -> Self {
        task.as_str().to_string()
    }
}

impl fmt::Display for ConversionTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the provider-agnostic instruction string for `text`.
///
/// Layout: preamble, optional task block, blank line, labelled verbatim
/// input, blank line, closing instruction.
pub fn build_prompt(text: &str, task: &ConversionTask) -> String {
    let clauses = task.clauses().unwrap_or("");
    let body = if text.is_empty() {
        EMPTY_INPUT_MARKER
    } else {
        text
    };

    let mut prompt = String::with_capacity(
        PREAMBLE.len() + clauses.len() + body.len() + CLOSING_INSTRUCTION.len() + 32,
    );
    prompt.push_str(PREAMBLE);
    prompt.push_str(clauses);
    prompt.push('\n');
    prompt.push_str(INPUT_LABEL);
    prompt.push('\n');
    prompt.push_str(body);
    prompt.push_str("\n\n");
    prompt.push_str(CLOSING_INSTRUCTION);
    prompt.push('\n');
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROVIDER_WORDS: &[&str] = &["claude", "anthropic", "openai", "gpt", "gemini", "google"];

    fn assert_provider_neutral(prompt: &str) {
        let lower = prompt.to_lowercase();
        for word in PROVIDER_WORDS {
            assert!(!lower.contains(word), "prompt mentions {word:?}");
        }
    }

    #[test]
    fn improve_prompt_has_all_blocks_in_order() {
        let prompt = build_prompt("Hello world", &ConversionTask::ImproveStructure);
        let pre = prompt.find(PREAMBLE).unwrap();
        let clauses = prompt.find(IMPROVE_CLAUSES).unwrap();
        let text = prompt.find("Hello world").unwrap();
        let closing = prompt.find(CLOSING_INSTRUCTION).unwrap();
        assert!(pre < clauses && clauses < text && text < closing);
        assert!(!prompt.contains(PRESERVE_CLAUSES));
        assert_provider_neutral(&prompt);
    }

    #[test]
    fn preserve_prompt_uses_preserve_clauses() {
        let prompt = build_prompt("Hello world", &ConversionTask::PreserveStructureOnly);
        assert!(prompt.contains(PRESERVE_CLAUSES));
        assert!(!prompt.contains(IMPROVE_CLAUSES));
        assert_provider_neutral(&prompt);
    }

    #[test]
    fn input_is_verbatim() {
        let input = "  # already a heading\n\n\tindented *stars* {braces} 100%  \n";
        for task in [
            ConversionTask::ImproveStructure,
            ConversionTask::PreserveStructureOnly,
        ] {
            let prompt = build_prompt(input, &task);
            assert!(prompt.contains(input));
            assert!(prompt.contains(&format!("{INPUT_LABEL}\n{input}")));
        }
    }

    #[test]
    fn unrecognized_task_degrades_to_preamble_only() {
        let task: ConversionTask = "summarise".parse().unwrap();
        assert_eq!(task, ConversionTask::Unrecognized("summarise".into()));

        let prompt = build_prompt("some text", &task);
        assert!(prompt.starts_with(PREAMBLE));
        assert!(!prompt.contains(IMPROVE_CLAUSES));
        assert!(!prompt.contains(PRESERVE_CLAUSES));
        assert!(prompt.contains("some text"));
        assert!(prompt.trim_end().ends_with(CLOSING_INSTRUCTION));
    }

    #[test]
    fn empty_input_gets_marker() {
        let prompt = build_prompt("", &ConversionTask::PreserveStructureOnly);
        assert!(prompt.contains(&format!("{INPUT_LABEL}\n{EMPTY_INPUT_MARKER}")));
        assert!(prompt.contains("only Markdown"));
    }

    #[test]
    fn whitespace_input_is_kept_not_replaced() {
        let prompt = build_prompt("   ", &ConversionTask::ImproveStructure);
        assert!(!prompt.contains(EMPTY_INPUT_MARKER));
        assert!(prompt.contains(&format!("{INPUT_LABEL}\n   \n")));
    }

    #[test]
    fn long_input_is_not_truncated() {
        let input = "word ".repeat(50_000);
        let prompt = build_prompt(&input, &ConversionTask::ImproveStructure);
        assert!(prompt.contains(&input));
    }

    #[test]
    fn task_aliases_parse() {
        assert_eq!(
            "improveStructure".parse::<ConversionTask>().unwrap(),
            ConversionTask::ImproveStructure
        );
        assert_eq!(
            "preserve-structure".parse::<ConversionTask>().unwrap(),
            ConversionTask::PreserveStructureOnly
        );
        assert_eq!(ConversionTask::default().to_string(), "improve");
    }

    #[test]
    fn task_serde_uses_selector_names() {
        let json = serde_json::to_string(&ConversionTask::PreserveStructureOnly).unwrap();
        assert_eq!(json, "\"structure\"");
        let back: ConversionTask = serde_json::from_str("\"improve\"").unwrap();
        assert_eq!(back, ConversionTask::ImproveStructure);
    }
}

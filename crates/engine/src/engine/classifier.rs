// Request classification: structured action ids and free-text chat messages
// resolve to the same intent vocabulary.
//
// Free text is matched against an ordered predicate table. The order is part
// of the contract: the first predicate with any matching keyword wins.

use polysync_common::intent::{ActionId, TransformIntent};
use serde::{Deserialize, Serialize};

/// Suggestion-only chat branches. These never mutate the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suggestion {
    Improve,
    Add,
}

/// Result of classifying a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Classification {
    Transform(TransformIntent),
    Suggest(Suggestion),
}

impl Classification {
    /// Collapse to the closed intent enumeration. Suggestion-only branches
    /// count as generic help.
    pub fn intent(self) -> TransformIntent {
        match self {
            Self::Transform(intent) => intent,
            Self::Suggest(_) => TransformIntent::GenericHelp,
        }
    }
}

/// Ordered predicate table. Do not reorder.
const PREDICATES: &[(&[&str], Classification)] = &[
    (&["summarize", "summary"], Classification::Transform(TransformIntent::Summarize)),
    (&["improve", "better"], Classification::Suggest(Suggestion::Improve)),
    (&["compliance", "regulation"], Classification::Transform(TransformIntent::AddCompliance)),
    (&["rewrite", "rephrase"], Classification::Transform(TransformIntent::Rephrase)),
    (&["add", "include"], Classification::Suggest(Suggestion::Add)),
];

/// Classify a free-text message. Never fails; generic help is the default.
pub fn classify_message(message: &str) -> Classification {
    let lower = message.to_lowercase();
    PREDICATES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(_, classification)| *classification)
        .unwrap_or(Classification::Transform(TransformIntent::GenericHelp))
}

/// Classify a free-text message down to the closed intent enumeration.
pub fn classify(message: &str) -> TransformIntent {
    classify_message(message).intent()
}

/// Structured menu actions map 1:1 onto intents.
pub fn classify_action(action: ActionId) -> TransformIntent {
    action.intent()
}

/// Canned prompts offered by the chat panel.
pub const QUICK_ACTIONS: [&str; 5] = [
    "Summarize this document",
    "Improve readability",
    "Add compliance section",
    "Make it more formal",
    "Check for clarity issues",
];

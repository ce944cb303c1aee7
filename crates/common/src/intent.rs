// Transform intents and the inline action menu that maps onto them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The classified transformation category to apply.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransformIntent {
    Summarize,
    Rephrase,
    Expand,
    AddCompliance,
    Simplify,
    Formalize,
    GenericHelp,
}

impl TransformIntent {
    pub const ALL: [TransformIntent; 7] = [
        Self::Summarize,
        Self::Rephrase,
        Self::Expand,
        Self::AddCompliance,
        Self::Simplify,
        Self::Formalize,
        Self::GenericHelp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Summarize => "summarize",
            Self::Rephrase => "rephrase",
            Self::Expand => "expand",
            Self::AddCompliance => "add_compliance",
            Self::Simplify => "simplify",
            Self::Formalize => "formalize",
            Self::GenericHelp => "generic_help",
        }
    }
}

impl fmt::Display for TransformIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry of the inline `@` action menu.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionId {
    Summarize,
    Rephrase,
    Expand,
    Compliance,
    Simplify,
    Formal,
}

impl ActionId {
    /// Menu order as presented to the user.
    pub const MENU: [ActionId; 6] = [
        Self::Summarize,
        Self::Rephrase,
        Self::Expand,
        Self::Compliance,
        Self::Simplify,
        Self::Formal,
    ];

    /// Wire id of the action (`"compliance"`, `"formal"`, ...).
    pub fn id(self) -> &'static str {
        match self {
            Self::Summarize => "summarize",
            Self::Rephrase => "rephrase",
            Self::Expand => "expand",
            Self::Compliance => "compliance",
            Self::Simplify => "simplify",
            Self::Formal => "formal",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Summarize => "Summarize",
            Self::Rephrase => "Rephrase",
            Self::Expand => "Expand",
            Self::Compliance => "Add Compliance",
            Self::Simplify => "Simplify",
            Self::Formal => "Make Formal",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Summarize => "Create a concise summary",
            Self::Rephrase => "Rewrite in different words",
            Self::Expand => "Add more detail and context",
            Self::Compliance => "Add compliance guidelines",
            Self::Simplify => "Make easier to understand",
            Self::Formal => "Adjust tone to be more formal",
        }
    }

    /// Structured actions map 1:1 onto intents.
    pub fn intent(self) -> TransformIntent {
        match self {
            Self::Summarize => TransformIntent::Summarize,
            Self::Rephrase => TransformIntent::Rephrase,
            Self::Expand => TransformIntent::Expand,
            Self::Compliance => TransformIntent::AddCompliance,
            Self::Simplify => TransformIntent::Simplify,
            Self::Formal => TransformIntent::Formalize,
        }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown action id `{0}`")]
pub struct UnknownActionError(pub String);

impl FromStr for ActionId {
    type Err = UnknownActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::MENU
            .into_iter()
            .find(|action| action.id().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownActionError(s.to_string()))
    }
}

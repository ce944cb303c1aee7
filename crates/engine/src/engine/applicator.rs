// Splice generated text back into the document.
//
// Default policy replaces the first occurrence of the selected text. The
// captured offsets must still fit the document, otherwise the result is
// appended. Beyond that they are not consulted, so a selection whose text
// appears more than once always lands on the earliest copy.
// `SelectionOffsets` mode targets the captured byte range instead.

use std::ops::Range;

use polysync_common::intent::TransformIntent;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::selection::Selection;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceMode {
    /// Replace the first occurrence of the selected text.
    #[default]
    FirstOccurrence,
    /// Replace exactly the captured range, if it still holds the selected
    /// text; otherwise behave like `FirstOccurrence`.
    SelectionOffsets,
}

/// Where the generated text ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Replaced the given byte range of the previous content.
    Replaced { range: Range<usize> },
    /// Appended at the end. `fallback` holds the reason when a non-empty
    /// selection could not be located.
    Appended { fallback: Option<ValidationError> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub content: String,
    pub placement: Placement,
}

/// Apply `generated` for `intent` using the first-occurrence policy and
/// return the new full document.
pub fn apply(
    intent: TransformIntent,
    selection: &Selection,
    full_document: &str,
    generated: &str,
) -> String {
    apply_with_mode(ReplaceMode::FirstOccurrence, intent, selection, full_document, generated)
        .content
}

pub fn apply_with_mode(
    mode: ReplaceMode,
    intent: TransformIntent,
    selection: &Selection,
    full_document: &str,
    generated: &str,
) -> Applied {
    if selection.is_empty() {
        return append(full_document, generated, None);
    }
    if let Err(reason) = selection.check_bounds(full_document) {
        debug!(%intent, %reason, "captured offsets no longer fit the document, appending");
        return append(full_document, generated, Some(reason));
    }

    let target = match mode {
        ReplaceMode::FirstOccurrence => first_occurrence(full_document, &selection.text),
        ReplaceMode::SelectionOffsets => selection
            .validate(full_document)
            .ok()
            .or_else(|| first_occurrence(full_document, &selection.text)),
    };

    match target {
        Some(range) => {
            let mut content =
                String::with_capacity(full_document.len() - range.len() + generated.len());
            content.push_str(&full_document[..range.start]);
            content.push_str(generated);
            content.push_str(&full_document[range.end..]);
            debug!(%intent, start = range.start, end = range.end, "replaced selection");
            Applied { content, placement: Placement::Replaced { range } }
        }
        None => {
            debug!(%intent, "selected text not found in document, appending instead");
            append(full_document, generated, Some(ValidationError::StaleSelection))
        }
    }
}

fn first_occurrence(haystack: &str, needle: &str) -> Option<Range<usize>> {
    haystack.find(needle).map(|start| start..start + needle.len())
}

fn append(full_document: &str, generated: &str, fallback: Option<ValidationError>) -> Applied {
    let mut content = String::with_capacity(full_document.len() + generated.len());
    content.push_str(full_document);
    content.push_str(generated);
    Applied { content, placement: Placement::Appended { fallback } }
}

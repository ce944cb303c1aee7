// Selection tracking: capture the highlighted span at the moment a trigger
// fires, and re-validate it before it is applied.
//
// Offsets are UTF-8 byte offsets into the document content.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ValidationError;

/// Typing this character opens the inline action menu.
pub const TRIGGER_CHAR: char = '@';

/// Raw caret/selection context reported by the editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaretContext {
    pub anchor: usize,
    pub focus: usize,
}

impl CaretContext {
    /// A collapsed caret with nothing highlighted.
    pub fn caret(offset: usize) -> Self {
        Self { anchor: offset, focus: offset }
    }

    pub fn range(anchor: usize, focus: usize) -> Self {
        Self { anchor, focus }
    }
}

/// A transient view of the highlighted text at capture time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub text: String,
    pub anchor_offset: usize,
    pub focus_offset: usize,
}

impl Selection {
    /// Nothing highlighted: the transform appends.
    pub fn empty_at(offset: usize) -> Self {
        Self { text: String::new(), anchor_offset: offset, focus_offset: offset }
    }

    /// Selection built from text alone, with offsets resolved to its first
    /// occurrence in `content` (or the end of `content` if absent).
    pub fn from_text(content: &str, text: &str) -> Self {
        match content.find(text) {
            Some(start) if !text.is_empty() => Self {
                text: text.to_string(),
                anchor_offset: start,
                focus_offset: start + text.len(),
            },
            _ => Self { text: text.to_string(), anchor_offset: content.len(), focus_offset: content.len() },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Normalized byte range (anchor and focus may be reversed).
    pub fn range(&self) -> Range<usize> {
        self.anchor_offset.min(self.focus_offset)..self.anchor_offset.max(self.focus_offset)
    }

    /// Check the captured offsets still point at the captured text in
    /// `content`. Returns the byte range on success.
    pub fn validate(&self, content: &str) -> Result<Range<usize>, ValidationError> {
        let range = self.check_bounds(content)?;
        if content[range.clone()] != self.text {
            return Err(ValidationError::StaleSelection);
        }
        Ok(range)
    }

    /// Check only that the captured offsets still fit inside `content`.
    pub fn check_bounds(&self, content: &str) -> Result<Range<usize>, ValidationError> {
        let range = self.range();
        check_offset(content, range.start)?;
        check_offset(content, range.end)?;
        Ok(range)
    }
}

fn check_offset(content: &str, offset: usize) -> Result<(), ValidationError> {
    if offset > content.len() {
        return Err(ValidationError::OffsetOutOfBounds { offset, len: content.len() });
    }
    if !content.is_char_boundary(offset) {
        return Err(ValidationError::NotCharBoundary(offset));
    }
    Ok(())
}

/// Read the highlighted substring out of the live content.
///
/// Invalid offsets (content shrank, or a split character) yield an empty
/// selection at the end of the content, so the transform appends.
pub fn capture_trigger(content: &str, caret: &CaretContext) -> Selection {
    let start = caret.anchor.min(caret.focus);
    let end = caret.anchor.max(caret.focus);
    let valid = check_offset(content, start).and_then(|_| check_offset(content, end));
    if let Err(error) = valid {
        debug!(%error, anchor = caret.anchor, focus = caret.focus, "invalid caret, falling back to append");
        return Selection::empty_at(content.len());
    }

    Selection {
        text: content[start..end].to_string(),
        anchor_offset: caret.anchor,
        focus_offset: caret.focus,
    }
}

/// Key events the tracker cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Char(char),
    Escape,
    Other,
}

/// What a key event did to the inline menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerSignal {
    /// The menu opened over this selection.
    MenuOpened(Selection),
    MenuDismissed,
    None,
}

/// Per-document inline menu state.
#[derive(Debug, Default)]
pub struct SelectionTracker {
    pending: Option<Selection>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a key event together with the content and caret at that instant.
    pub fn on_key(&mut self, key: KeyEvent, content: &str, caret: &CaretContext) -> TriggerSignal {
        match key {
            KeyEvent::Char(TRIGGER_CHAR) => {
                let selection = capture_trigger(content, caret);
                self.pending = Some(selection.clone());
                TriggerSignal::MenuOpened(selection)
            }
            KeyEvent::Escape if self.pending.is_some() => {
                self.pending = None;
                TriggerSignal::MenuDismissed
            }
            _ => TriggerSignal::None,
        }
    }

    pub fn menu_open(&self) -> bool {
        self.pending.is_some()
    }

    /// Close the menu, returning the selection it was opened over.
    pub fn take_pending(&mut self) -> Option<Selection> {
        self.pending.take()
    }

    /// Reopen the menu over a selection whose action did not complete.
    pub fn restore(&mut self, selection: Selection) {
        self.pending = Some(selection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_reads_highlighted_text() {
        let content = "Policy A applies.";
        let sel = capture_trigger(content, &CaretContext::range(0, 8));
        assert_eq!(sel.text, "Policy A");
        assert_eq!(sel.range(), 0..8);
    }

    #[test]
    fn capture_handles_backwards_selection() {
        let content = "Policy A applies.";
        let sel = capture_trigger(content, &CaretContext::range(8, 0));
        assert_eq!(sel.text, "Policy A");
        assert_eq!(sel.anchor_offset, 8);
        assert_eq!(sel.range(), 0..8);
    }

    #[test]
    fn collapsed_caret_is_empty_selection() {
        let sel = capture_trigger("abc", &CaretContext::caret(1));
        assert!(sel.is_empty());
        assert_eq!(sel.range(), 1..1);
    }

    #[test]
    fn out_of_bounds_caret_falls_back_to_end() {
        let sel = capture_trigger("abc", &CaretContext::range(1, 40));
        assert!(sel.is_empty());
        assert_eq!(sel.anchor_offset, 3);
    }

    #[test]
    fn split_character_falls_back_to_end() {
        let content = "né";
        // 'é' is two bytes starting at 1; offset 2 is mid-character.
        let sel = capture_trigger(content, &CaretContext::range(0, 2));
        assert!(sel.is_empty());
        assert_eq!(sel.anchor_offset, content.len());
    }

    #[test]
    fn validate_detects_shrunk_content() {
        let sel = capture_trigger("Policy A applies.", &CaretContext::range(9, 16));
        assert_eq!(
            sel.validate("Policy"),
            Err(ValidationError::OffsetOutOfBounds { offset: 9, len: 6 })
        );
    }

    #[test]
    fn validate_detects_changed_text() {
        let sel = capture_trigger("Policy A applies.", &CaretContext::range(0, 8));
        assert_eq!(sel.validate("Policy B applies."), Err(ValidationError::StaleSelection));
        assert_eq!(sel.validate("Policy A applies, always."), Ok(0..8));
    }

    #[test]
    fn from_text_resolves_first_occurrence() {
        let sel = Selection::from_text("x foo y foo", "foo");
        assert_eq!(sel.range(), 2..5);
        let missing = Selection::from_text("x", "foo");
        assert_eq!(missing.range(), 1..1);
        assert_eq!(missing.text, "foo");
    }

    #[test]
    fn trigger_char_opens_menu_and_escape_dismisses() {
        let mut tracker = SelectionTracker::new();
        let content = "Policy A";

        let signal = tracker.on_key(KeyEvent::Char('@'), content, &CaretContext::range(0, 6));
        assert_eq!(
            signal,
            TriggerSignal::MenuOpened(Selection {
                text: "Policy".into(),
                anchor_offset: 0,
                focus_offset: 6
            })
        );
        assert!(tracker.menu_open());

        assert_eq!(
            tracker.on_key(KeyEvent::Escape, content, &CaretContext::caret(0)),
            TriggerSignal::MenuDismissed
        );
        assert!(!tracker.menu_open());
        assert_eq!(
            tracker.on_key(KeyEvent::Escape, content, &CaretContext::caret(0)),
            TriggerSignal::None
        );
    }

    #[test]
    fn ordinary_keys_do_not_trigger() {
        let mut tracker = SelectionTracker::new();
        assert_eq!(
            tracker.on_key(KeyEvent::Char('a'), "abc", &CaretContext::caret(0)),
            TriggerSignal::None
        );
        assert_eq!(tracker.on_key(KeyEvent::Other, "abc", &CaretContext::caret(0)), TriggerSignal::None);
        assert!(tracker.take_pending().is_none());
    }
}

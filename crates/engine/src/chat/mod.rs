// Conversation log: per-document chat history.
//
// Message ids are millisecond timestamps rendered as strings, bumped so that
// they strictly increase even when two messages land in the same millisecond.

use chrono::{DateTime, Utc};
use polysync_common::types::{chat_key, now_millis, Message, Role};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, ValidationError};
use crate::store::records::{decode_messages, encode_messages};
use crate::store::KeyValueStore;

pub const WELCOME_ID: &str = "welcome";
pub const WELCOME_TEXT: &str = "Hi! I'm your AI assistant. I can help you improve your document by summarizing, rephrasing, adding compliance information, and more. Just ask me anything or select text and use @ for quick actions!";

/// Hands out strictly increasing millisecond ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageClock {
    last: i64,
}

impl MessageClock {
    /// Continue after the largest numeric id in `messages`.
    pub fn after(messages: &[Message]) -> Self {
        let last = messages.iter().filter_map(|m| m.id.parse::<i64>().ok()).max().unwrap_or(0);
        Self { last }
    }

    pub fn next(&mut self, now: DateTime<Utc>) -> String {
        let id = now.timestamp_millis().max(self.last + 1);
        self.last = id;
        id.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationLog {
    pub document_id: String,
    pub messages: Vec<Message>,
    #[serde(skip)]
    clock: MessageClock,
}

impl ConversationLog {
    /// A fresh log holding only the welcome message.
    pub fn welcome(document_id: impl Into<String>) -> Self {
        let welcome = Message {
            id: WELCOME_ID.to_string(),
            role: Role::Assistant,
            content: WELCOME_TEXT.to_string(),
            timestamp: now_millis(),
        };
        Self { document_id: document_id.into(), messages: vec![welcome], clock: MessageClock::default() }
    }

    pub fn from_messages(document_id: impl Into<String>, messages: Vec<Message>) -> Self {
        let clock = MessageClock::after(&messages);
        Self { document_id: document_id.into(), messages, clock }
    }

    /// True when nothing but the synthesized welcome message is present.
    pub fn is_welcome_only(&self) -> bool {
        matches!(self.messages.as_slice(), [only] if only.id == WELCOME_ID)
    }

    /// Append a user turn. Blank messages are rejected.
    pub fn append_user_message(&mut self, content: &str) -> Result<&Message, ValidationError> {
        if content.trim().is_empty() {
            return Err(ValidationError::EmptyRequest);
        }
        Ok(self.push(Role::User, content.to_string()))
    }

    pub fn append_assistant_message(&mut self, content: impl Into<String>) -> &Message {
        self.push(Role::Assistant, content.into())
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn push(&mut self, role: Role, content: String) -> &Message {
        let now = now_millis();
        let id = self.clock.next(now);
        self.messages.push(Message { id, role, content, timestamp: now });
        let last = self.messages.len() - 1;
        &self.messages[last]
    }
}

/// Load the log for a document, synthesizing the welcome message when none is
/// stored. Never writes.
pub async fn load<S: KeyValueStore>(store: &S, document_id: &str) -> Result<ConversationLog, StoreError> {
    let key = chat_key(document_id);
    match store.get(&key).await? {
        Some(bytes) => {
            let messages = decode_messages(&key, &bytes)?;
            debug!(doc_id = %document_id, count = messages.len(), "loaded conversation log");
            Ok(ConversationLog::from_messages(document_id, messages))
        }
        None => Ok(ConversationLog::welcome(document_id)),
    }
}

/// Persist the log. A welcome-only log is not written.
///
/// Returns whether a write happened.
pub async fn persist<S: KeyValueStore>(store: &S, log: &ConversationLog) -> Result<bool, StoreError> {
    if log.is_welcome_only() {
        debug!(doc_id = %log.document_id, "welcome-only log, skipping persist");
        return Ok(false);
    }
    let bytes = encode_messages(&log.document_id, &log.messages)?;
    store.set(&chat_key(&log.document_id), bytes).await?;
    Ok(true)
}

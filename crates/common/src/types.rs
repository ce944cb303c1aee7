// Core domain types shared across all PolySync crates.
//
// Field names on the wire are camelCase so that records written by earlier
// browser builds (`uploadedAt`, `type`) decode unchanged. Timestamps are
// millisecond-precision ISO-8601 (`2024-06-10T06:13:20.000Z`) in both
// directions.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Storage key prefix for document records.
pub const DOC_KEY_PREFIX: &str = "doc_";
/// Storage key prefix for conversation logs.
pub const CHAT_KEY_PREFIX: &str = "chat_";

/// Key under which a document record is stored: `doc_<id>`.
pub fn doc_key(doc_id: &str) -> String {
    format!("{DOC_KEY_PREFIX}{doc_id}")
}

/// Key under which a document's conversation log is stored: `chat_<id>`.
pub fn chat_key(doc_id: &str) -> String {
    format!("{CHAT_KEY_PREFIX}{doc_id}")
}

/// An uploaded document and its editable content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub name: String,
    /// MIME type reported at intake. Absent for records created without one.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(with = "iso_millis")]
    pub uploaded_at: DateTime<Utc>,
    /// Stamped on every direct edit or applied transform; absent until the
    /// first one.
    #[serde(default, with = "iso_millis::option", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Opaque content (HTML in practice). Single source of truth for the doc.
    pub content: String,
}

impl Document {
    /// Create a new document with a fresh id.
    pub fn new(name: impl Into<String>, mime_type: Option<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            name: name.into(),
            mime_type,
            uploaded_at: now_millis(),
            updated_at: None,
            content: content.into(),
        }
    }

    /// Name without its final extension (`policy.docx` → `policy`).
    pub fn stem(&self) -> &str {
        strip_extension(&self.name)
    }
}

/// Strip the final `.ext` from a file name, keeping dotfiles intact.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    /// Older logs spell this `ai`.
    #[serde(alias = "ai")]
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Assistant => f.write_str("assistant"),
        }
    }
}

/// A single chat turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    /// Older logs name this field `type`.
    #[serde(alias = "type")]
    pub role: Role,
    pub content: String,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

/// Current time truncated to the millisecond precision records keep.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        DateTime::<Utc>::deserialize(deserializer)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            at: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match at {
                Some(at) => super::serialize(at, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<DateTime<Utc>>::deserialize(deserializer)
        }
    }
}

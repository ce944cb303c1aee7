// Record codec: explicit JSON schemas for stored documents and chat logs.
//
// Stored values are decoded against `Document` / `Vec<Message>`; anything
// that doesn't fit is a `StoreError::Decode`, never a silent pass-through.

use polysync_common::types::{chat_key, doc_key, Document, Message};

use crate::error::StoreError;
use crate::store::KeyValueStore;

pub fn encode_document(doc: &Document) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(doc).map_err(|e| StoreError::Encode {
        key: doc_key(&doc.id),
        message: e.to_string(),
    })
}

pub fn decode_document(key: &str, bytes: &[u8]) -> Result<Document, StoreError> {
    serde_json::from_slice(bytes)
        .map_err(|e| StoreError::Decode { key: key.to_string(), message: e.to_string() })
}

/// Chat logs are stored as a bare JSON array of messages.
pub fn encode_messages(doc_id: &str, messages: &[Message]) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(messages)
        .map_err(|e| StoreError::Encode { key: chat_key(doc_id), message: e.to_string() })
}

pub fn decode_messages(key: &str, bytes: &[u8]) -> Result<Vec<Message>, StoreError> {
    serde_json::from_slice(bytes)
        .map_err(|e| StoreError::Decode { key: key.to_string(), message: e.to_string() })
}

/// Load and decode a document record, `None` if no record exists.
pub async fn load_document<S: KeyValueStore>(
    store: &S,
    doc_id: &str,
) -> Result<Option<Document>, StoreError> {
    let key = doc_key(doc_id);
    match store.get(&key).await? {
        Some(bytes) => decode_document(&key, &bytes).map(Some),
        None => Ok(None),
    }
}

pub async fn store_document<S: KeyValueStore>(store: &S, doc: &Document) -> Result<(), StoreError> {
    let bytes = encode_document(doc)?;
    store.set(&doc_key(&doc.id), bytes).await
}

/// Decode every stored document. Malformed records fail the whole listing.
pub async fn list_documents<S: KeyValueStore>(store: &S) -> Result<Vec<Document>, StoreError> {
    let keys = store.keys_with_prefix(polysync_common::types::DOC_KEY_PREFIX).await?;
    let mut docs = Vec::with_capacity(keys.len());
    for key in keys {
        if let Some(bytes) = store.get(&key).await? {
            docs.push(decode_document(&key, &bytes)?);
        }
    }
    docs.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then_with(|| a.id.cmp(&b.id)));
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn document_round_trip_preserves_content_bytes() {
        let store = MemoryStore::new();
        let content = "<h1>Policy</h1>\n<p>Tabs\tand ünïcödé 🚀 &amp; \"quotes\"</p>\r\n";
        let doc = Document::new("policy.txt", Some("text/plain".into()), content);

        store_document(&store, &doc).await.unwrap();
        let loaded = load_document(&store, &doc.id).await.unwrap().unwrap();

        assert_eq!(loaded.content.as_bytes(), content.as_bytes());
        assert_eq!(loaded, doc);
    }

    #[tokio::test]
    async fn missing_document_is_none() {
        let store = MemoryStore::new();
        assert!(load_document(&store, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_document_is_decode_error() {
        let store = MemoryStore::new();
        store.insert_raw("doc_bad", r#"{"id": 42}"#);

        let err = load_document(&store, "bad").await.unwrap_err();
        assert!(matches!(err, StoreError::Decode { ref key, .. } if key == "doc_bad"));
    }

    #[test]
    fn malformed_messages_is_decode_error() {
        let err = decode_messages("chat_1", br#"[{"id":"1","role":"robot"}]"#).unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[tokio::test]
    async fn list_documents_newest_first() {
        let store = MemoryStore::new();
        let mut older = Document::new("older.txt", None, "a");
        older.uploaded_at = Utc::now() - Duration::hours(1);
        let newer = Document::new("newer.txt", None, "b");
        store_document(&store, &older).await.unwrap();
        store_document(&store, &newer).await.unwrap();
        store.insert_raw("chat_x", "[]");

        let docs = list_documents(&store).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].name, "newer.txt");
        assert_eq!(docs[1].name, "older.txt");
    }
}

// Engine error taxonomy.
//
// Validation problems are recovered inside the engine (append fallback,
// GenericHelp) and only logged. Provider, store and not-found errors reach the
// editing surface.

use thiserror::Error;

/// Bad selection offsets or an empty request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("selection offset {offset} is out of bounds for content of length {len}")]
    OffsetOutOfBounds { offset: usize, len: usize },
    #[error("selection offset {0} is not on a character boundary")]
    NotCharBoundary(usize),
    #[error("selection text no longer matches the document")]
    StaleSelection,
    #[error("request is empty")]
    EmptyRequest,
}

/// The transform provider was unavailable or failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("transform provider unavailable: {0}")]
    Unavailable(String),
    #[error("transform provider failed: {0}")]
    Failed(String),
    #[error("transform provider returned empty output")]
    EmptyOutput,
}

/// A persistence read or write failed, or stored data is malformed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store backend error on `{key}`: {message}")]
    Backend { key: String, message: String },
    #[error("malformed record under `{key}`: {message}")]
    Decode { key: String, message: String },
    #[error("failed to encode record for `{key}`: {message}")]
    Encode { key: String, message: String },
}

/// Errors surfaced by editing-session operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("document `{0}` not found")]
    NotFound(String),
}

impl EngineError {
    /// Stable machine-readable code for the editing surface.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::Provider(_) => "PROVIDER_FAILED",
            Self::Store(_) => "SAVE_FAILED",
            Self::NotFound(_) => "DOCUMENT_NOT_FOUND",
        }
    }

    /// User-facing notice text.
    pub fn notice(&self) -> String {
        match self {
            Self::Validation(e) => format!("Request ignored: {e}."),
            Self::Provider(_) => "Failed to get AI response. Please try again.".to_string(),
            Self::Store(e) => format!("Your changes could not be saved ({e}). They are kept and will be retried."),
            Self::NotFound(_) => "The document you're looking for doesn't exist.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(EngineError::NotFound("x".into()).code(), "DOCUMENT_NOT_FOUND");
        assert_eq!(EngineError::from(ProviderError::EmptyOutput).code(), "PROVIDER_FAILED");
        assert_eq!(
            EngineError::from(StoreError::Backend { key: "doc_1".into(), message: "disk".into() })
                .code(),
            "SAVE_FAILED"
        );
        assert_eq!(EngineError::from(ValidationError::EmptyRequest).code(), "VALIDATION_FAILED");
    }

    #[test]
    fn display_is_transparent_for_wrapped_errors() {
        let err = EngineError::from(StoreError::Decode {
            key: "chat_7".into(),
            message: "expected value".into(),
        });
        assert_eq!(err.to_string(), "malformed record under `chat_7`: expected value");
        assert_eq!(EngineError::NotFound("7".into()).to_string(), "document `7` not found");
    }

    #[test]
    fn provider_notice_asks_for_retry() {
        let err = EngineError::from(ProviderError::Unavailable("offline".into()));
        assert!(err.notice().contains("try again"));
    }
}

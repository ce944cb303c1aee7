// Transform provider: the capability that turns a request into generated text.
//
// The engine is provider-agnostic. `CannedProvider` is the built-in keyword
// responder used by the CLI; it waits a random synthetic latency before
// answering so callers exercise the suspending path.

mod canned;

use std::future::Future;

use polysync_common::intent::TransformIntent;

use crate::engine::classifier::Classification;
use crate::error::ProviderError;

pub use canned::{CannedProvider, LatencyRange};

/// What the provider is asked to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// Inline transform whose output is spliced into the document.
    Inline(TransformIntent),
    /// Chat reply to a classified free-text message.
    Chat(Classification),
}

impl RequestKind {
    pub fn intent(&self) -> TransformIntent {
        match self {
            Self::Inline(intent) => *intent,
            Self::Chat(classification) => classification.intent(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub kind: RequestKind,
    /// Selected text for inline requests, the user's message for chat.
    pub context: String,
}

impl GenerateRequest {
    pub fn inline(intent: TransformIntent, context: impl Into<String>) -> Self {
        Self { kind: RequestKind::Inline(intent), context: context.into() }
    }

    pub fn chat(classification: Classification, message: impl Into<String>) -> Self {
        Self { kind: RequestKind::Chat(classification), context: message.into() }
    }
}

/// Produces transformed text. Implementations must report failure as an
/// error; an empty string is never a valid "no answer".
pub trait TransformProvider: Send + Sync + 'static {
    fn generate(
        &self,
        request: GenerateRequest,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;
}

/// Call the provider and reject empty output.
pub(crate) async fn generate_checked<P: TransformProvider>(
    provider: &P,
    request: GenerateRequest,
) -> Result<String, ProviderError> {
    let text = provider.generate(request).await?;
    if text.is_empty() {
        return Err(ProviderError::EmptyOutput);
    }
    Ok(text)
}

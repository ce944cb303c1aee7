// Keyword-driven canned responses with synthetic latency.

use std::time::Duration;

use polysync_common::intent::TransformIntent;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::classifier::{Classification, Suggestion};
use crate::error::ProviderError;
use crate::provider::{GenerateRequest, RequestKind, TransformProvider};

/// Inclusive bounds for the synthetic delay before each response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyRange {
    pub min: Duration,
    pub max: Duration,
}

impl LatencyRange {
    pub const ZERO: LatencyRange = LatencyRange { min: Duration::ZERO, max: Duration::ZERO };

    /// Bounds are swapped if given in the wrong order.
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

impl Default for LatencyRange {
    fn default() -> Self {
        Self::from_millis(1000, 3000)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CannedProvider {
    latency: LatencyRange,
}

impl CannedProvider {
    pub fn new(latency: LatencyRange) -> Self {
        Self { latency }
    }

    /// No synthetic delay.
    pub fn instant() -> Self {
        Self { latency: LatencyRange::ZERO }
    }

    pub fn latency(&self) -> LatencyRange {
        self.latency
    }
}

impl TransformProvider for CannedProvider {
    async fn generate(&self, request: GenerateRequest) -> Result<String, ProviderError> {
        let delay = self.latency.sample();
        debug!(kind = ?request.kind, delay_ms = delay.as_millis() as u64, "generating canned response");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        Ok(match request.kind {
            RequestKind::Inline(intent) => inline_fragment(intent, &request.context),
            RequestKind::Chat(classification) => chat_reply(classification).to_string(),
        })
    }
}

/// HTML fragment for an inline action. Expand and compliance keep the
/// selected text in front of the generated addition.
pub fn inline_fragment(intent: TransformIntent, selected: &str) -> String {
    match intent {
        TransformIntent::Summarize => "<p><strong>Summary:</strong> This section outlines key policy guidelines and implementation strategies for organizational compliance.</p>".to_string(),
        TransformIntent::Rephrase => "<p>This content has been rephrased to improve clarity while maintaining the original meaning and intent.</p>".to_string(),
        TransformIntent::Expand => format!("{selected}<p>Additionally, it's important to consider the broader implications and ensure that all stakeholders understand their responsibilities in implementing these guidelines effectively.</p>"),
        TransformIntent::AddCompliance => format!("{selected}<ul><li>Ensure compliance with industry regulations</li><li>Regular audits and reviews required</li><li>Document all compliance activities</li></ul>"),
        TransformIntent::Simplify => "<p>In simple terms: This policy helps ensure everyone follows the same rules and procedures.</p>".to_string(),
        TransformIntent::Formalize => "<p>This document establishes the formal procedures and protocols that must be adhered to by all personnel within the organization.</p>".to_string(),
        TransformIntent::GenericHelp => "<p>Select some text and choose an action to summarize, rephrase, expand, simplify, formalize, or add compliance guidance.</p>".to_string(),
    }
}

pub fn chat_reply(classification: Classification) -> &'static str {
    match classification {
        Classification::Transform(TransformIntent::Summarize) => {
            "I've analyzed your document. Here's a summary: This policy document outlines key organizational guidelines, implementation procedures, and compliance requirements. The main focus areas include team coordination, regular policy reviews, and maintaining industry standards."
        }
        Classification::Suggest(Suggestion::Improve) => {
            "Here are some suggestions to improve your document:\n\n1. Add more specific examples\n2. Include compliance checkpoints\n3. Define clear responsibilities\n4. Add implementation timelines\n\nWould you like me to help implement any of these improvements?"
        }
        Classification::Transform(TransformIntent::AddCompliance) => {
            "For compliance enhancement, consider adding:\n\n• Regular audit schedules\n• Documentation requirements\n• Training mandates\n• Risk assessment procedures\n• Incident reporting protocols\n\nI can help you add any of these sections to your document."
        }
        Classification::Transform(TransformIntent::Rephrase) => {
            "I can help you rewrite sections of your document. Please select the specific text you'd like me to rephrase, or let me know which section needs improvement. I can adjust the tone, clarity, or formality level as needed."
        }
        Classification::Suggest(Suggestion::Add) => {
            "I can help you add new content to your document. What specific information would you like to include? I can help with:\n\n• Policy sections\n• Procedures\n• Guidelines\n• Compliance requirements\n• Best practices\n\nJust let me know the topic and I'll draft the content for you."
        }
        Classification::Transform(_) => {
            "I understand you'd like help with your document. I can assist with:\n\n• Summarizing content\n• Improving clarity and readability\n• Adding compliance information\n• Rephrasing sections\n• Expanding on topics\n• Making content more formal or casual\n\nWhat specifically would you like me to help you with?"
        }
    }
}

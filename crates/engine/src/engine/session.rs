// Editing session: the single owner of one open document.
//
// Holds the live content, the conversation log and the save coordinator.
// Provider calls and store writes run without any session lock held, so edits
// keep flowing while a transform or save is pending. Late transform results
// apply against whatever content is current.

use std::sync::{Arc, Mutex, MutexGuard};

use polysync_common::intent::{ActionId, TransformIntent};
use polysync_common::types::{now_millis, Document, Message};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::chat::{self, ConversationLog};
use crate::engine::applicator::{apply_with_mode, Placement, ReplaceMode};
use crate::engine::classifier::{classify_action, classify_message};
use crate::engine::selection::{
    capture_trigger, CaretContext, KeyEvent, Selection, SelectionTracker, TriggerSignal,
};
use crate::error::{EngineError, StoreError};
use crate::provider::{generate_checked, GenerateRequest, TransformProvider};
use crate::save::{PeriodicSave, SaveCoordinator, SaveOutcome, SaveState, SaveTrigger};
use crate::store::records::{load_document, store_document};
use crate::store::KeyValueStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    pub replace_mode: ReplaceMode,
}

/// Result of an inline transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutcome {
    pub intent: TransformIntent,
    pub selection: Selection,
    pub placement: Placement,
    /// Full document content after the splice.
    pub content: String,
}

/// Result of a chat send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    /// The message was blank and nothing was recorded.
    Ignored,
    Replied { reply: Message, save: SaveOutcome },
}

pub struct EditingSession<S: KeyValueStore, P: TransformProvider> {
    store: Arc<S>,
    provider: Arc<P>,
    options: SessionOptions,
    document: Mutex<Document>,
    log: Mutex<ConversationLog>,
    tracker: Mutex<SelectionTracker>,
    saves: SaveCoordinator,
}

impl<S: KeyValueStore, P: TransformProvider> EditingSession<S, P> {
    /// Open a stored document. A missing record is `NotFound`; the session is
    /// never opened over an empty document.
    pub async fn open(
        store: Arc<S>,
        provider: Arc<P>,
        doc_id: &str,
        options: SessionOptions,
    ) -> Result<Self, EngineError> {
        let document = load_document(store.as_ref(), doc_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(doc_id.to_string()))?;
        let log = chat::load(store.as_ref(), doc_id).await?;
        info!(doc_id = %doc_id, messages = log.len(), "editing session opened");

        Ok(Self {
            store,
            provider,
            options,
            document: Mutex::new(document),
            log: Mutex::new(log),
            tracker: Mutex::new(SelectionTracker::new()),
            saves: SaveCoordinator::new(),
        })
    }

    pub fn id(&self) -> String {
        lock(&self.document).id.clone()
    }

    pub fn document(&self) -> Document {
        lock(&self.document).clone()
    }

    pub fn content(&self) -> String {
        lock(&self.document).content.clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        lock(&self.log).messages.clone()
    }

    fn log_snapshot(&self) -> ConversationLog {
        lock(&self.log).clone()
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    // ── Direct edits ───────────────────────────────────────────────

    /// Replace the content with a direct user edit.
    pub fn edit(&self, content: impl Into<String>) {
        {
            let mut doc = lock(&self.document);
            doc.content = content.into();
            doc.updated_at = Some(now_millis());
        }
        self.saves.mark_dirty();
    }

    // ── Inline transforms ──────────────────────────────────────────

    /// Feed a key event from the editing surface. `@` opens the action menu
    /// over the selection at `caret`; Escape dismisses it.
    pub fn on_key(&self, key: KeyEvent, caret: &CaretContext) -> TriggerSignal {
        let content = self.content();
        let signal = lock(&self.tracker).on_key(key, &content, caret);
        if let TriggerSignal::MenuOpened(selection) = &signal {
            debug!(doc_id = %self.id(), range = ?selection.range(), "action menu opened");
        }
        signal
    }

    pub fn menu_open(&self) -> bool {
        lock(&self.tracker).menu_open()
    }

    /// Fire a menu action over the selection captured when the menu opened.
    /// With no open menu the action appends. A provider failure reopens the
    /// menu over the same selection.
    pub async fn fire_menu_action(&self, action: ActionId) -> Result<TransformOutcome, EngineError> {
        let pending = lock(&self.tracker).take_pending();
        let selection = pending.unwrap_or_else(|| {
            debug!(%action, "no open menu, action applies at end of document");
            Selection::empty_at(self.content().len())
        });
        let result = self.transform_selection(classify_action(action), selection.clone()).await;
        if matches!(result, Err(EngineError::Provider(_))) && !selection.is_empty() {
            lock(&self.tracker).restore(selection);
        }
        result
    }

    /// Capture the selection at `caret` now and transform it.
    pub async fn transform(
        &self,
        intent: TransformIntent,
        caret: &CaretContext,
    ) -> Result<TransformOutcome, EngineError> {
        let selection = capture_trigger(&self.content(), caret);
        self.transform_selection(intent, selection).await
    }

    /// Transform a previously captured selection. The selection is re-checked
    /// against the content current when the provider answers.
    pub async fn transform_selection(
        &self,
        intent: TransformIntent,
        selection: Selection,
    ) -> Result<TransformOutcome, EngineError> {
        let doc_id = self.id();
        info!(doc_id = %doc_id, %intent, selected = selection.text.len(), "transform requested");

        let request = GenerateRequest::inline(intent, selection.text.clone());
        let generated = generate_checked(self.provider.as_ref(), request).await.map_err(|error| {
            warn!(doc_id = %doc_id, %intent, %error, "transform provider failed");
            EngineError::from(error)
        })?;

        let applied = {
            let mut doc = lock(&self.document);
            let applied =
                apply_with_mode(self.options.replace_mode, intent, &selection, &doc.content, &generated);
            doc.content.clone_from(&applied.content);
            doc.updated_at = Some(now_millis());
            applied
        };
        self.saves.mark_dirty();

        if let Placement::Appended { fallback: Some(reason) } = &applied.placement {
            debug!(doc_id = %doc_id, %reason, "selection could not be located, appended");
        }
        Ok(TransformOutcome {
            intent,
            selection,
            placement: applied.placement,
            content: applied.content,
        })
    }

    // ── Chat ───────────────────────────────────────────────────────

    /// Send a chat message and record the reply. The document is never
    /// touched. On provider failure the user's message stays in the log.
    pub async fn chat(&self, message: &str) -> Result<ChatOutcome, EngineError> {
        let doc_id = self.id();
        if let Err(reason) = lock(&self.log).append_user_message(message) {
            debug!(doc_id = %doc_id, %reason, "chat message ignored");
            return Ok(ChatOutcome::Ignored);
        }
        self.saves.mark_dirty();

        let classification = classify_message(message);
        debug!(doc_id = %doc_id, ?classification, "chat message classified");

        let request = GenerateRequest::chat(classification, message);
        let reply = match generate_checked(self.provider.as_ref(), request).await {
            Ok(text) => text,
            Err(error) => {
                warn!(doc_id = %doc_id, %error, "chat provider failed");
                return Err(error.into());
            }
        };

        let reply = lock(&self.log).append_assistant_message(reply).clone();
        self.saves.mark_dirty();

        let save = self.save(SaveTrigger::Chat).await?;
        Ok(ChatOutcome::Replied { reply, save })
    }

    // ── Persistence ────────────────────────────────────────────────

    /// Persist the document and the conversation log. Dropped when another
    /// save is in flight.
    pub async fn save(&self, trigger: SaveTrigger) -> Result<SaveOutcome, EngineError> {
        let outcome = self
            .saves
            .run(trigger, || async {
                let document = self.document();
                let log = self.log_snapshot();
                self.write(&document, &log).await
            })
            .await?;
        Ok(outcome)
    }

    /// Wait out any in-flight save, then save until nothing is left dirty.
    pub async fn flush(&self) -> Result<(), EngineError> {
        loop {
            self.saves.wait_idle().await;
            if !self.saves.state().dirty {
                return Ok(());
            }
            self.save(SaveTrigger::Manual).await?;
        }
    }

    async fn write(&self, document: &Document, log: &ConversationLog) -> Result<(), StoreError> {
        store_document(self.store.as_ref(), document).await?;
        chat::persist(self.store.as_ref(), log).await?;
        Ok(())
    }

    pub fn save_state(&self) -> SaveState {
        self.saves.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveState> {
        self.saves.subscribe()
    }
}

impl<S: KeyValueStore, P: TransformProvider> PeriodicSave for EditingSession<S, P> {
    async fn periodic_save(&self) -> Result<SaveOutcome, EngineError> {
        self.save(SaveTrigger::Periodic).await
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::provider::CannedProvider;
    use crate::store::MemoryStore;

    /// Returns a fixed string for every request.
    struct Fixed(Result<String, ProviderError>);

    impl TransformProvider for Fixed {
        async fn generate(&self, _request: GenerateRequest) -> Result<String, ProviderError> {
            self.0.clone()
        }
    }

    fn seeded(content: &str) -> (MemoryStore, Document) {
        let store = MemoryStore::new();
        let doc = Document::new("policy.txt", Some("text/plain".into()), content);
        store.insert_raw(
            polysync_common::types::doc_key(&doc.id),
            crate::store::records::encode_document(&doc).unwrap(),
        );
        (store, doc)
    }

    async fn open<P: TransformProvider>(
        store: &MemoryStore,
        doc: &Document,
        provider: P,
    ) -> EditingSession<MemoryStore, P> {
        EditingSession::open(Arc::new(store.clone()), Arc::new(provider), &doc.id, SessionOptions::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn missing_document_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let err = EditingSession::open(store, Arc::new(CannedProvider::instant()), "nope", SessionOptions::default())
            .await
            .err()
            .unwrap();
        assert_eq!(err, EngineError::NotFound("nope".into()));
    }

    #[tokio::test]
    async fn formalize_whole_document() {
        let (store, doc) = seeded("Policy A");
        let session = open(&store, &doc, Fixed(Ok("<p>Formal text</p>".into()))).await;

        let outcome = session
            .transform(TransformIntent::Formalize, &CaretContext::range(0, 8))
            .await
            .unwrap();
        assert_eq!(outcome.content, "<p>Formal text</p>");
        assert_eq!(session.content(), "<p>Formal text</p>");
        assert!(session.save_state().dirty);
    }

    #[tokio::test]
    async fn menu_action_uses_selection_from_trigger() {
        let (store, doc) = seeded("<p>Intro</p><p>Body</p>");
        let session = open(&store, &doc, CannedProvider::instant()).await;

        session.on_key(KeyEvent::Char('@'), &CaretContext::range(12, 23));
        assert!(session.menu_open());
        let outcome = session.fire_menu_action(ActionId::Simplify).await.unwrap();
        assert_eq!(outcome.selection.text, "<p>Body</p>");
        assert!(session.content().starts_with("<p>Intro</p><p>In simple terms"));
        assert!(!session.menu_open());
    }

    #[tokio::test]
    async fn provider_failure_leaves_document_and_reopens_menu() {
        let (store, doc) = seeded("Policy A");
        let session = open(&store, &doc, Fixed(Err(ProviderError::Unavailable("offline".into())))).await;

        session.on_key(KeyEvent::Char('@'), &CaretContext::range(0, 6));
        let err = session.fire_menu_action(ActionId::Formal).await.unwrap_err();
        assert_eq!(err.code(), "PROVIDER_FAILED");
        assert_eq!(session.content(), "Policy A");
        assert!(session.menu_open());
        assert!(!session.save_state().dirty);
    }

    #[tokio::test]
    async fn empty_provider_output_is_an_error() {
        let (store, doc) = seeded("Policy A");
        let session = open(&store, &doc, Fixed(Ok(String::new()))).await;
        let err = session
            .transform(TransformIntent::Expand, &CaretContext::caret(0))
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::Provider(ProviderError::EmptyOutput));
    }

    #[tokio::test]
    async fn edit_after_capture_falls_back_to_append() {
        let (store, doc) = seeded("Policy A");
        let session = open(&store, &doc, Fixed(Ok("<p>X</p>".into()))).await;
        let selection = capture_trigger(&session.content(), &CaretContext::range(0, 8));
        session.edit("Totally new");

        let outcome = session.transform_selection(TransformIntent::Rephrase, selection).await.unwrap();
        assert_eq!(outcome.content, "Totally new<p>X</p>");
        assert!(matches!(outcome.placement, Placement::Appended { fallback: Some(_) }));
    }

    #[tokio::test]
    async fn chat_never_touches_document() {
        let (store, doc) = seeded("Policy A");
        let session = open(&store, &doc, CannedProvider::instant()).await;

        let outcome = session.chat("please summarize this").await.unwrap();
        let ChatOutcome::Replied { reply, save } = outcome else { panic!("expected reply") };
        assert!(reply.content.starts_with("I've analyzed your document"));
        assert!(matches!(save, SaveOutcome::Saved { .. }));
        assert_eq!(session.content(), "Policy A");
        assert_eq!(session.messages().len(), 3);
        assert_eq!(store.writes_to(&polysync_common::types::chat_key(&doc.id)), 1);
    }

    #[tokio::test]
    async fn blank_chat_is_ignored() {
        let (store, doc) = seeded("Policy A");
        let session = open(&store, &doc, CannedProvider::instant()).await;
        assert_eq!(session.chat("   ").await.unwrap(), ChatOutcome::Ignored);
        assert_eq!(session.messages().len(), 1);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn chat_provider_failure_keeps_user_message() {
        let (store, doc) = seeded("Policy A");
        let session = open(&store, &doc, Fixed(Err(ProviderError::Failed("boom".into())))).await;
        assert!(session.chat("rewrite it").await.is_err());
        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "rewrite it");
    }

    #[tokio::test]
    async fn failed_save_keeps_changes_in_memory() {
        let (store, doc) = seeded("Policy A");
        let session = open(&store, &doc, CannedProvider::instant()).await;
        session.edit("Policy B");
        store.set_fail_writes(true);

        let err = session.save(SaveTrigger::Manual).await.unwrap_err();
        assert_eq!(err.code(), "SAVE_FAILED");
        assert!(session.save_state().dirty);
        assert_eq!(session.content(), "Policy B");

        store.set_fail_writes(false);
        session.save(SaveTrigger::Manual).await.unwrap();
        assert!(!session.save_state().dirty);
    }
}

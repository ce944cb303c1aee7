// Local document workspace: config, the SQLite store and the built-in
// provider, resolved once per invocation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use polysync_common::types::Document;
use polysync_engine::config::EngineConfig;
use polysync_engine::engine::{EditingSession, SessionOptions};
use polysync_engine::error::EngineError;
use polysync_engine::provider::CannedProvider;
use polysync_engine::store::records::{list_documents, load_document};
use polysync_engine::store::SqliteStore;
use tracing::debug;

pub type Session = EditingSession<SqliteStore, CannedProvider>;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct GlobalOpts {
    /// Config file (defaults to ~/.polysync/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory holding polysync.db (overrides the config file).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

pub struct Workspace {
    pub config: EngineConfig,
    pub store: Arc<SqliteStore>,
    provider: Arc<CannedProvider>,
}

impl Workspace {
    pub fn open(opts: &GlobalOpts) -> Result<Self> {
        let mut config = match &opts.config {
            Some(path) => EngineConfig::load_from(path)
                .with_context(|| format!("failed to load config `{}`", path.display()))?,
            None => EngineConfig::load(),
        };
        if let Some(dir) = &opts.data_dir {
            config.data_dir = Some(dir.clone());
        }
        let data_dir = config
            .resolved_data_dir()
            .ok_or_else(|| anyhow!("could not determine home directory; pass --data-dir"))?;
        Self::with_config(config, &data_dir)
    }

    pub fn with_config(config: EngineConfig, data_dir: &Path) -> Result<Self> {
        debug!(data_dir = %data_dir.display(), "opening workspace");
        let store = SqliteStore::open_in(data_dir)?;
        let provider = CannedProvider::new(config.latency());
        Ok(Self { config, store: Arc::new(store), provider: Arc::new(provider) })
    }

    pub fn session_options(&self) -> SessionOptions {
        self.config.session_options()
    }

    /// Resolve a document by id, or by exact name when that is unambiguous.
    pub async fn resolve(&self, query: &str) -> Result<Document> {
        if let Some(doc) = load_document(self.store.as_ref(), query).await? {
            return Ok(doc);
        }
        let mut matches: Vec<Document> =
            list_documents(self.store.as_ref()).await?.into_iter().filter(|d| d.name == query).collect();
        match matches.len() {
            0 => Err(EngineError::NotFound(query.to_string()).into()),
            1 => Ok(matches.remove(0)),
            n => Err(anyhow!("document name `{query}` is ambiguous ({n} matches); use the id")),
        }
    }

    pub async fn open_session(&self, query: &str, options: SessionOptions) -> Result<Session> {
        let doc = self.resolve(query).await?;
        let session =
            EditingSession::open(self.store.clone(), self.provider.clone(), &doc.id, options).await?;
        Ok(session)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::workspace;
    use super::*;
    use polysync_engine::store::records::store_document;

    #[tokio::test]
    async fn resolves_by_id_then_name() {
        let (_dir, ws) = workspace();
        let doc = Document::new("Remote Work.docx", None, "x");
        store_document(ws.store.as_ref(), &doc).await.unwrap();

        assert_eq!(ws.resolve(&doc.id).await.unwrap().id, doc.id);
        assert_eq!(ws.resolve("Remote Work.docx").await.unwrap().id, doc.id);
    }

    #[tokio::test]
    async fn unknown_document_is_not_found() {
        let (_dir, ws) = workspace();
        let err = ws.resolve("ghost").await.unwrap_err();
        assert_eq!(err.downcast_ref::<EngineError>(), Some(&EngineError::NotFound("ghost".into())));
    }

    #[tokio::test]
    async fn duplicate_names_are_ambiguous() {
        let (_dir, ws) = workspace();
        for _ in 0..2 {
            store_document(ws.store.as_ref(), &Document::new("a.txt", None, "")).await.unwrap();
        }
        let err = ws.resolve("a.txt").await.unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
    }
}

// `polysync edit`: replace a document's content and save it.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Args;
use polysync_engine::save::{SaveOutcome, SaveTrigger};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::commands::report;
use crate::output::OutputFormat;
use crate::workspace::{GlobalOpts, Workspace};

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Document id or name.
    pub doc: String,

    /// New content, given inline.
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub content: Option<String>,

    /// Read the new content from this file.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditResult {
    pub id: String,
    pub bytes: usize,
    pub saved_at: Option<DateTime<Utc>>,
}

pub async fn run(args: EditArgs, globals: &GlobalOpts) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    report(format, call_edit(&args, globals).await, format_human)
}

async fn call_edit(args: &EditArgs, globals: &GlobalOpts) -> anyhow::Result<EditResult> {
    let content = match (&args.content, &args.file) {
        (Some(content), _) => content.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path).await?,
        (None, None) => anyhow::bail!("pass --content or --file"),
    };
    let ws = Workspace::open(globals)?;
    edit(&ws, &args.doc, content).await
}

pub(crate) async fn edit(ws: &Workspace, query: &str, content: String) -> anyhow::Result<EditResult> {
    let session = ws.open_session(query, ws.session_options()).await?;
    session.edit(content);
    let outcome = session.save(SaveTrigger::Manual).await?;
    debug!(doc_id = %session.id(), ?outcome, "edit saved");
    Ok(EditResult {
        id: session.id(),
        bytes: session.content().len(),
        saved_at: match outcome {
            SaveOutcome::Saved { at } => Some(at),
            SaveOutcome::Dropped => None,
        },
    })
}

fn format_human(result: &EditResult) -> String {
    match result.saved_at {
        Some(at) => format!("Saved {} ({} bytes) at {}", result.id, result.bytes, at.format("%H:%M:%S")),
        None => format!("Save of {} skipped: another save was in progress", result.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::test_support::workspace;
    use polysync_common::types::Document;
    use polysync_engine::store::records::{load_document, store_document};

    #[tokio::test]
    async fn edit_persists_new_content() {
        let (_dir, ws) = workspace();
        let doc = Document::new("a.txt", None, "old");
        store_document(ws.store.as_ref(), &doc).await.unwrap();

        let result = edit(&ws, &doc.id, "<p>new</p>".into()).await.unwrap();
        assert_eq!(result.bytes, 10);
        assert!(result.saved_at.is_some());

        let stored = load_document(ws.store.as_ref(), &doc.id).await.unwrap().unwrap();
        assert_eq!(stored.content, "<p>new</p>");
        assert!(stored.updated_at.is_some());
    }
}

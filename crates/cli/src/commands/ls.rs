// `polysync ls`: list stored documents, newest first.

use chrono::{DateTime, Utc};
use clap::Args;
use polysync_common::types::Document;
use polysync_engine::store::records::list_documents;
use serde::{Deserialize, Serialize};

use crate::commands::report;
use crate::output::OutputFormat;
use crate::workspace::{GlobalOpts, Workspace};

#[derive(Debug, Args)]
pub struct LsArgs {
    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LsResult {
    #[serde(default)]
    pub documents: Vec<DocEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocEntry {
    pub id: String,
    pub name: String,
    pub uploaded_at: DateTime<Utc>,
    pub bytes: usize,
}

impl From<Document> for DocEntry {
    fn from(doc: Document) -> Self {
        Self { bytes: doc.content.len(), id: doc.id, name: doc.name, uploaded_at: doc.uploaded_at }
    }
}

pub async fn run(args: LsArgs, globals: &GlobalOpts) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    report(format, call_ls(globals).await, format_human)
}

async fn call_ls(globals: &GlobalOpts) -> anyhow::Result<LsResult> {
    let ws = Workspace::open(globals)?;
    ls(&ws).await
}

pub(crate) async fn ls(ws: &Workspace) -> anyhow::Result<LsResult> {
    let documents = list_documents(ws.store.as_ref()).await?;
    Ok(LsResult { documents: documents.into_iter().map(DocEntry::from).collect() })
}

fn format_human(result: &LsResult) -> String {
    if result.documents.is_empty() {
        return "No documents yet. Run: polysync import <file>".into();
    }

    let mut lines = Vec::new();
    lines.push(format!("{} document(s)", result.documents.len()));
    for d in &result.documents {
        lines.push(format!(
            "  {}  {}  (uploaded {}, {} bytes)",
            d.id,
            d.name,
            d.uploaded_at.format("%Y-%m-%d %H:%M"),
            d.bytes
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output;
    use crate::workspace::test_support::workspace;
    use polysync_engine::store::records::store_document;

    #[test]
    fn human_format_empty() {
        let output = format_human(&LsResult { documents: vec![] });
        assert!(output.contains("No documents"));
    }

    #[tokio::test]
    async fn lists_stored_documents() {
        let (_dir, ws) = workspace();
        let doc = Document::new("Policy.docx", None, "<p>abc</p>");
        store_document(ws.store.as_ref(), &doc).await.unwrap();

        let result = ls(&ws).await.unwrap();
        assert_eq!(result.documents.len(), 1);
        assert_eq!(result.documents[0].bytes, 10);

        let human = format_human(&result);
        assert!(human.contains("1 document(s)"));
        assert!(human.contains("Policy.docx"));

        let mut buf = Vec::new();
        output::write_output(&mut buf, OutputFormat::Json, &result, format_human).unwrap();
        let parsed: LsResult = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed.documents[0].id, doc.id);
    }
}

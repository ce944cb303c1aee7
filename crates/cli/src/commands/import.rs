// `polysync import`: validate an upload and store it as a new document.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Args;
use polysync_engine::intake::{format_file_size, import_file};
use serde::{Deserialize, Serialize};

use crate::commands::report;
use crate::output::OutputFormat;
use crate::workspace::{GlobalOpts, Workspace};

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// File to import (.docx, .pdf, .doc or .txt, up to 10MB).
    pub path: PathBuf,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: Option<String>,
    pub size: String,
    pub uploaded_at: DateTime<Utc>,
}

pub async fn run(args: ImportArgs, globals: &GlobalOpts) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    report(format, call_import(&args.path, globals).await, format_human)
}

async fn call_import(path: &std::path::Path, globals: &GlobalOpts) -> anyhow::Result<ImportResult> {
    let ws = Workspace::open(globals)?;
    import(&ws, path).await
}

pub(crate) async fn import(ws: &Workspace, path: &std::path::Path) -> anyhow::Result<ImportResult> {
    let size = tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0);
    let doc = import_file(ws.store.as_ref(), path).await?;
    Ok(ImportResult {
        id: doc.id,
        name: doc.name,
        mime_type: doc.mime_type,
        size: format_file_size(size),
        uploaded_at: doc.uploaded_at,
    })
}

fn format_human(result: &ImportResult) -> String {
    format!("Imported {} ({}) as {}", result.name, result.size, result.id)
}

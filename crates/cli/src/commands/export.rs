// `polysync export`: write a document's content to `<stem>.html`.

use std::path::PathBuf;

use clap::Args;
use polysync_engine::export::export_html;
use serde::{Deserialize, Serialize};

use crate::commands::report;
use crate::output::OutputFormat;
use crate::workspace::{GlobalOpts, Workspace};

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Document id or name.
    pub doc: String,

    /// Output directory (defaults to the current directory).
    #[arg(long, short)]
    pub out: Option<PathBuf>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResult {
    pub id: String,
    pub path: PathBuf,
}

pub async fn run(args: ExportArgs, globals: &GlobalOpts) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    report(format, call_export(&args, globals).await, |r| format!("Exported to {}", r.path.display()))
}

async fn call_export(args: &ExportArgs, globals: &GlobalOpts) -> anyhow::Result<ExportResult> {
    let ws = Workspace::open(globals)?;
    let out = args.out.clone().unwrap_or_else(|| PathBuf::from("."));
    export(&ws, &args.doc, out).await
}

pub(crate) async fn export(ws: &Workspace, query: &str, out: PathBuf) -> anyhow::Result<ExportResult> {
    let doc = ws.resolve(query).await?;
    let id = doc.id.clone();
    let path = tokio::task::spawn_blocking(move || export_html(&doc, &out)).await??;
    Ok(ExportResult { id, path })
}

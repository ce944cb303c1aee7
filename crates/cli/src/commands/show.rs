// `polysync show`: print a document's content.

use chrono::{DateTime, Utc};
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::commands::report;
use crate::output::OutputFormat;
use crate::workspace::{GlobalOpts, Workspace};

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Document id or name.
    pub doc: String,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowResult {
    pub id: String,
    pub name: String,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub content: String,
}

pub async fn run(args: ShowArgs, globals: &GlobalOpts) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    report(format, call_show(&args.doc, globals).await, |r| r.content.clone())
}

async fn call_show(doc: &str, globals: &GlobalOpts) -> anyhow::Result<ShowResult> {
    let ws = Workspace::open(globals)?;
    show(&ws, doc).await
}

pub(crate) async fn show(ws: &Workspace, query: &str) -> anyhow::Result<ShowResult> {
    let doc = ws.resolve(query).await?;
    Ok(ShowResult {
        id: doc.id,
        name: doc.name,
        uploaded_at: doc.uploaded_at,
        updated_at: doc.updated_at,
        content: doc.content,
    })
}

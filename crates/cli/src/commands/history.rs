// `polysync history`: print a document's conversation log.

use clap::Args;
use polysync_common::types::{Message, Role};
use serde::{Deserialize, Serialize};

use crate::commands::report;
use crate::output::OutputFormat;
use crate::workspace::{GlobalOpts, Workspace};

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Document id or name.
    pub doc: String,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResult {
    pub id: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

pub async fn run(args: HistoryArgs, globals: &GlobalOpts) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    report(format, call_history(&args.doc, globals).await, |r| format_messages(&r.messages))
}

async fn call_history(doc: &str, globals: &GlobalOpts) -> anyhow::Result<HistoryResult> {
    let ws = Workspace::open(globals)?;
    history(&ws, doc).await
}

pub(crate) async fn history(ws: &Workspace, query: &str) -> anyhow::Result<HistoryResult> {
    let doc = ws.resolve(query).await?;
    let log = polysync_engine::chat::load(ws.store.as_ref(), &doc.id).await?;
    Ok(HistoryResult { id: doc.id, messages: log.messages })
}

pub(crate) fn format_messages(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| {
            let who = match m.role {
                Role::User => "you",
                Role::Assistant => "assistant",
            };
            format!("[{}] {who}: {}", m.timestamp.format("%H:%M"), m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::test_support::workspace;
    use polysync_common::types::Document;
    use polysync_engine::store::records::store_document;

    #[tokio::test]
    async fn fresh_document_has_only_the_welcome() {
        let (_dir, ws) = workspace();
        let doc = Document::new("p.txt", None, "x");
        store_document(ws.store.as_ref(), &doc).await.unwrap();

        let result = history(&ws, "p.txt").await.unwrap();
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].id, "welcome");
        assert!(format_messages(&result.messages).contains("assistant: "));
    }
}

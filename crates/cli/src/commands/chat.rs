// `polysync chat`: send one message (or a quick action) to the assistant.

use clap::Args;
use polysync_common::types::Message;
use polysync_engine::engine::classifier::QUICK_ACTIONS;
use polysync_engine::engine::ChatOutcome;
use polysync_engine::save::SaveOutcome;
use serde::{Deserialize, Serialize};

use crate::commands::report;
use crate::output::OutputFormat;
use crate::workspace::{GlobalOpts, Workspace};

#[derive(Debug, Args)]
pub struct ChatArgs {
    /// Document id or name.
    pub doc: String,

    /// Message to send.
    #[arg(required_unless_present = "quick", conflicts_with = "quick")]
    pub message: Option<String>,

    /// Send quick action N (1-5) instead of a message.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub quick: Option<u8>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResult {
    pub id: String,
    /// Absent when the message was blank and ignored.
    #[serde(default)]
    pub reply: Option<Message>,
    pub saved: bool,
}

pub async fn run(args: ChatArgs, globals: &GlobalOpts) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    report(format, call_chat(&args, globals).await, format_human)
}

async fn call_chat(args: &ChatArgs, globals: &GlobalOpts) -> anyhow::Result<ChatResult> {
    let message = match (args.quick, &args.message) {
        (Some(n), _) => quick_action(n)?.to_string(),
        (None, Some(message)) => message.clone(),
        (None, None) => anyhow::bail!("pass a message or --quick N"),
    };
    let ws = Workspace::open(globals)?;
    chat(&ws, &args.doc, &message).await
}

/// Quick action by its 1-based position in the panel.
pub(crate) fn quick_action(n: u8) -> anyhow::Result<&'static str> {
    usize::from(n)
        .checked_sub(1)
        .and_then(|i| QUICK_ACTIONS.get(i).copied())
        .ok_or_else(|| anyhow::anyhow!("quick action must be between 1 and {}", QUICK_ACTIONS.len()))
}

pub(crate) async fn chat(ws: &Workspace, query: &str, message: &str) -> anyhow::Result<ChatResult> {
    let session = ws.open_session(query, ws.session_options()).await?;
    let result = match session.chat(message).await? {
        ChatOutcome::Ignored => ChatResult { id: session.id(), reply: None, saved: false },
        ChatOutcome::Replied { reply, save } => ChatResult {
            id: session.id(),
            reply: Some(reply),
            saved: matches!(save, SaveOutcome::Saved { .. }),
        },
    };
    Ok(result)
}

fn format_human(result: &ChatResult) -> String {
    match &result.reply {
        Some(reply) => reply.content.clone(),
        None => "Nothing to send.".to_string(),
    }
}

// `polysync transform`: run one inline action over a selection and save.

use std::ops::Range;
use std::str::FromStr;

use clap::{Args, ValueEnum};
use polysync_common::intent::ActionId;
use polysync_engine::engine::applicator::{Placement, ReplaceMode};
use polysync_engine::engine::selection::{capture_trigger, CaretContext, Selection};
use polysync_engine::engine::SessionOptions;
use polysync_engine::save::SaveTrigger;
use serde::{Deserialize, Serialize};

use crate::commands::report;
use crate::output::OutputFormat;
use crate::workspace::{GlobalOpts, Workspace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    FirstOccurrence,
    SelectionOffsets,
}

impl From<ModeArg> for ReplaceMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::FirstOccurrence => ReplaceMode::FirstOccurrence,
            ModeArg::SelectionOffsets => ReplaceMode::SelectionOffsets,
        }
    }
}

#[derive(Debug, Args)]
pub struct TransformArgs {
    /// Document id or name.
    pub doc: String,

    /// Menu action: summarize, rephrase, expand, compliance, simplify, formal.
    #[arg(long, short)]
    pub action: String,

    /// Selected text. With no selection the result is appended.
    #[arg(long, conflicts_with = "range")]
    pub select: Option<String>,

    /// Selected byte range, as `start..end`.
    #[arg(long, value_parser = parse_range)]
    pub range: Option<Range<usize>>,

    /// How the result is spliced in (overrides the config file).
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformResult {
    pub id: String,
    pub action: String,
    pub intent: String,
    pub selected: String,
    pub placement: String,
    pub content: String,
}

pub async fn run(args: TransformArgs, globals: &GlobalOpts) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    report(format, call_transform(&args, globals).await, format_human)
}

async fn call_transform(args: &TransformArgs, globals: &GlobalOpts) -> anyhow::Result<TransformResult> {
    let action = ActionId::from_str(&args.action)?;
    let ws = Workspace::open(globals)?;
    let target = match (&args.select, &args.range) {
        (Some(text), _) => Target::Text(text.clone()),
        (None, Some(range)) => Target::Range(range.clone()),
        (None, None) => Target::End,
    };
    transform(&ws, &args.doc, action, target, args.mode.map(ReplaceMode::from)).await
}

/// What the action applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    Text(String),
    Range(Range<usize>),
    End,
}

impl Target {
    pub(crate) fn selection(&self, content: &str) -> Selection {
        match self {
            Self::Text(text) => Selection::from_text(content, text),
            Self::Range(range) => capture_trigger(content, &CaretContext::range(range.start, range.end)),
            Self::End => Selection::empty_at(content.len()),
        }
    }
}

pub(crate) async fn transform(
    ws: &Workspace,
    query: &str,
    action: ActionId,
    target: Target,
    mode: Option<ReplaceMode>,
) -> anyhow::Result<TransformResult> {
    let mut options: SessionOptions = ws.session_options();
    if let Some(mode) = mode {
        options.replace_mode = mode;
    }
    let session = ws.open_session(query, options).await?;
    let selection = target.selection(&session.content());
    let outcome = session.transform_selection(action.intent(), selection).await?;
    session.save(SaveTrigger::Manual).await?;

    Ok(TransformResult {
        id: session.id(),
        action: action.id().to_string(),
        intent: outcome.intent.to_string(),
        selected: outcome.selection.text,
        placement: describe_placement(&outcome.placement),
        content: outcome.content,
    })
}

pub(crate) fn describe_placement(placement: &Placement) -> String {
    match placement {
        Placement::Replaced { range } => format!("replaced bytes {}..{}", range.start, range.end),
        Placement::Appended { fallback: None } => "appended".to_string(),
        Placement::Appended { fallback: Some(reason) } => format!("appended ({reason})"),
    }
}

/// Parse `start..end` into a byte range.
pub(crate) fn parse_range(s: &str) -> Result<Range<usize>, String> {
    let (start, end) = s.split_once("..").ok_or_else(|| format!("expected start..end, got `{s}`"))?;
    let start: usize = start.trim().parse().map_err(|_| format!("invalid start offset `{start}`"))?;
    let end: usize = end.trim().parse().map_err(|_| format!("invalid end offset `{end}`"))?;
    Ok(start..end)
}

fn format_human(result: &TransformResult) -> String {
    format!("{} ({}): {}\n\n{}", result.action, result.intent, result.placement, result.content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::test_support::workspace;
    use polysync_common::types::Document;
    use polysync_engine::store::records::{load_document, store_document};

    #[test]
    fn parses_ranges() {
        assert_eq!(parse_range("0..8"), Ok(0..8));
        assert_eq!(parse_range(" 3 .. 5 "), Ok(3..5));
        assert!(parse_range("3-5").is_err());
        assert!(parse_range("a..5").is_err());
    }

    #[test]
    fn placements_read_plainly() {
        assert_eq!(describe_placement(&Placement::Replaced { range: 0..8 }), "replaced bytes 0..8");
        assert_eq!(describe_placement(&Placement::Appended { fallback: None }), "appended");
    }

    #[tokio::test]
    async fn summarize_selected_text_replaces_it() {
        let (_dir, ws) = workspace();
        let doc = Document::new("p.txt", None, "intro Policy A outro");
        store_document(ws.store.as_ref(), &doc).await.unwrap();

        let result = transform(&ws, &doc.id, ActionId::Summarize, Target::Text("Policy A".into()), None)
            .await
            .unwrap();
        assert_eq!(result.intent, "summarize");
        assert_eq!(result.selected, "Policy A");
        assert!(result.content.starts_with("intro "));
        assert!(result.content.ends_with(" outro"));
        assert!(!result.content.contains("Policy A outro"));

        let stored = load_document(ws.store.as_ref(), &doc.id).await.unwrap().unwrap();
        assert_eq!(stored.content, result.content);
    }

    #[tokio::test]
    async fn no_selection_appends() {
        let (_dir, ws) = workspace();
        let doc = Document::new("p.txt", None, "<p>Body</p>");
        store_document(ws.store.as_ref(), &doc).await.unwrap();

        let result = transform(&ws, &doc.id, ActionId::Compliance, Target::End, None).await.unwrap();
        assert_eq!(result.placement, "appended");
        assert!(result.content.starts_with("<p>Body</p>"));
        assert!(result.content.len() > "<p>Body</p>".len());
    }

    #[tokio::test]
    async fn unknown_document_fails() {
        let (_dir, ws) = workspace();
        let err = transform(&ws, "ghost", ActionId::Formal, Target::End, None).await.unwrap_err();
        assert_eq!(crate::exit_code::ExitCode::from_error(&err), crate::exit_code::ExitCode::NotFound);
    }
}

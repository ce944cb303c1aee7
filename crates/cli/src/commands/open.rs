// `polysync open`: interactive editing session over stdin.
//
// Plain lines are appended to the document. Lines starting with `:` are
// editor commands, `@` drives the inline action menu and `/` talks to the
// assistant. Autosave runs for the life of the session.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use clap::Args;
use polysync_common::intent::ActionId;
use polysync_engine::engine::selection::{CaretContext, KeyEvent, Selection, TriggerSignal};
use polysync_engine::engine::ChatOutcome;
use polysync_engine::save::{start_autosave, SaveOutcome, SaveTrigger};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::commands::chat::quick_action;
use crate::commands::history::format_messages;
use crate::commands::transform::{describe_placement, parse_range};
use crate::output::{self, OutputFormat};
use crate::workspace::{GlobalOpts, Session, Workspace};

#[derive(Debug, Args)]
pub struct OpenArgs {
    /// Document id or name.
    pub doc: String,
}

const HELP: &str = "\
Commands:
  <text>          append text to the document
  :select <text>  select the first occurrence of <text>
  :range a..b     select a byte range
  @  or :menu     open the action menu over the selection
  @<action>       run an action (summarize, rephrase, expand, compliance, simplify, formal)
  :esc            dismiss the action menu
  /chat <msg>     ask the assistant
  /quick <n>      send quick action 1-5
  :history        show the conversation
  :show           print the document
  :status         show the save indicator
  :save           save now
  :quit           save and exit";

/// Result of one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue(String),
    Quit,
}

pub struct Repl {
    session: Arc<Session>,
    caret: CaretContext,
}

impl Repl {
    pub fn new(session: Arc<Session>) -> Self {
        let end = session.content().len();
        Self { session, caret: CaretContext::caret(end) }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub async fn handle_line(&mut self, line: &str) -> Result<Step> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (head, rest) = match line.split_once(' ') {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let reply = match head {
            ":quit" | ":q" => return Ok(Step::Quit),
            ":help" | ":h" => HELP.to_string(),
            ":show" => self.session.content(),
            ":status" => self.status(),
            ":save" => self.save().await?,
            ":history" => format_messages(&self.session.messages()),
            ":select" => self.select(rest)?,
            ":range" => {
                let range = parse_range(rest).map_err(|e| anyhow!(e))?;
                self.caret = CaretContext::range(range.start, range.end);
                format!("Selected bytes {}..{}", range.start, range.end)
            }
            "@" | ":menu" => self.open_menu(),
            ":esc" => match self.session.on_key(KeyEvent::Escape, &self.caret) {
                TriggerSignal::MenuDismissed => "Menu dismissed".to_string(),
                _ => "Menu is not open".to_string(),
            },
            "/chat" => self.chat(rest).await?,
            "/quick" => {
                let n: u8 = rest.parse().map_err(|_| anyhow!("usage: /quick <1-5>"))?;
                self.chat(quick_action(n)?).await?
            }
            _ if head.starts_with('@') => self.fire(&head[1..]).await?,
            _ if head.starts_with(':') || head.starts_with('/') => {
                bail!("unknown command `{head}`; type :help")
            }
            _ => self.append(line),
        };
        Ok(Step::Continue(reply))
    }

    fn status(&self) -> String {
        let state = self.session.save_state();
        let menu = if self.session.menu_open() { " • menu open" } else { "" };
        format!("{}{menu}", state.indicator())
    }

    async fn save(&self) -> Result<String> {
        Ok(match self.session.save(SaveTrigger::Manual).await? {
            SaveOutcome::Saved { .. } => self.session.save_state().indicator(),
            SaveOutcome::Dropped => "Save already in progress".to_string(),
        })
    }

    fn select(&mut self, text: &str) -> Result<String> {
        if text.is_empty() {
            bail!("usage: :select <text>");
        }
        let content = self.session.content();
        if !content.contains(text) {
            bail!("`{text}` does not appear in the document");
        }
        let selection = Selection::from_text(&content, text);
        self.caret = CaretContext::range(selection.anchor_offset, selection.focus_offset);
        Ok(format!("Selected `{text}`"))
    }

    fn open_menu(&self) -> String {
        let mut lines = Vec::new();
        if let TriggerSignal::MenuOpened(selection) = self.session.on_key(KeyEvent::Char('@'), &self.caret) {
            if selection.is_empty() {
                lines.push("Nothing selected; the result will be appended.".to_string());
            } else {
                lines.push(format!("Selected: {}", selection.text));
            }
        }
        for action in ActionId::MENU {
            lines.push(format!("  @{:<11} {}: {}", action.id(), action.label(), action.description()));
        }
        lines.join("\n")
    }

    async fn fire(&mut self, id: &str) -> Result<String> {
        let action = ActionId::from_str(id)?;
        if !self.session.menu_open() {
            self.session.on_key(KeyEvent::Char('@'), &self.caret);
        }
        let outcome = self.session.fire_menu_action(action).await?;
        self.caret = CaretContext::caret(outcome.content.len());
        Ok(format!("{}: {}", action.label(), describe_placement(&outcome.placement)))
    }

    async fn chat(&self, message: &str) -> Result<String> {
        Ok(match self.session.chat(message).await? {
            ChatOutcome::Ignored => "Nothing to send.".to_string(),
            ChatOutcome::Replied { reply, .. } => reply.content,
        })
    }

    fn append(&mut self, line: &str) -> String {
        let mut content = self.session.content();
        if !content.is_empty() {
            content.push('\n');
        }
        content.push_str(line);
        self.caret = CaretContext::caret(content.len());
        self.session.edit(content);
        String::new()
    }
}

pub async fn run(args: OpenArgs, globals: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(globals)?;
    let session = Arc::new(ws.open_session(&args.doc, ws.session_options()).await?);
    let autosave = start_autosave(session.clone(), ws.config.autosave_interval());
    let document = session.document();
    println!("Editing {} ({}). Type :help for commands.", document.name, document.id);

    let mut repl = Repl::new(session.clone());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match repl.handle_line(&line).await {
            Ok(Step::Quit) => break,
            Ok(Step::Continue(reply)) if reply.is_empty() => {}
            Ok(Step::Continue(reply)) => println!("{reply}"),
            Err(e) => output::print_anyhow_error(OutputFormat::Human, &e),
        }
    }

    autosave.shutdown().await;
    if let Err(error) = session.flush().await {
        warn!(%error, "final save failed");
        return Err(error.into());
    }
    info!(doc_id = %session.id(), "editing session closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::test_support::workspace;
    use polysync_common::types::Document;
    use polysync_engine::store::records::{load_document, store_document};

    async fn repl_over(content: &str) -> (tempfile::TempDir, Workspace, Repl) {
        let (dir, ws) = workspace();
        let doc = Document::new("p.txt", None, content);
        store_document(ws.store.as_ref(), &doc).await.unwrap();
        let session = Arc::new(ws.open_session(&doc.id, ws.session_options()).await.unwrap());
        (dir, ws, Repl::new(session))
    }

    fn text(step: Step) -> String {
        match step {
            Step::Continue(text) => text,
            Step::Quit => panic!("unexpected quit"),
        }
    }

    #[tokio::test]
    async fn plain_lines_append_and_save() {
        let (_dir, ws, mut repl) = repl_over("first").await;
        repl.handle_line("second").await.unwrap();
        assert_eq!(repl.session().content(), "first\nsecond");
        assert!(text(repl.handle_line(":status").await.unwrap()).contains("Not saved yet"));

        let saved = text(repl.handle_line(":save").await.unwrap());
        assert!(saved.starts_with("Last saved: "));
        let stored = load_document(ws.store.as_ref(), &repl.session().id()).await.unwrap().unwrap();
        assert_eq!(stored.content, "first\nsecond");
    }

    #[tokio::test]
    async fn select_then_action_replaces_selection() {
        let (_dir, _ws, mut repl) = repl_over("intro Policy A outro").await;
        repl.handle_line(":select Policy A").await.unwrap();
        let menu = text(repl.handle_line("@").await.unwrap());
        assert!(menu.contains("Selected: Policy A"));
        assert!(menu.contains("@formal"));

        let done = text(repl.handle_line("@formal").await.unwrap());
        assert!(done.starts_with("Make Formal: replaced bytes 6..14"));
        let content = repl.session().content();
        assert!(content.starts_with("intro <p>This document establishes"));
        assert!(content.ends_with(" outro"));
    }

    #[tokio::test]
    async fn escape_dismisses_open_menu() {
        let (_dir, _ws, mut repl) = repl_over("<p>Body</p>").await;
        repl.handle_line(":range 0..11").await.unwrap();
        repl.handle_line(":menu").await.unwrap();
        assert_eq!(text(repl.handle_line(":esc").await.unwrap()), "Menu dismissed");
        assert_eq!(text(repl.handle_line(":esc").await.unwrap()), "Menu is not open");
    }

    #[tokio::test]
    async fn chat_and_history() {
        let (_dir, _ws, mut repl) = repl_over("Policy").await;
        let reply = text(repl.handle_line("/quick 3").await.unwrap());
        assert!(reply.starts_with("For compliance enhancement"));
        let history = text(repl.handle_line(":history").await.unwrap());
        assert!(history.contains("you: Add compliance section"));
        assert_eq!(repl.session().content(), "Policy");
    }

    #[tokio::test]
    async fn bad_input_is_an_error_and_quit_stops() {
        let (_dir, _ws, mut repl) = repl_over("x").await;
        assert!(repl.handle_line("@shout").await.is_err());
        assert!(repl.handle_line(":select nothing-here").await.is_err());
        assert!(repl.handle_line(":bogus").await.is_err());
        assert_eq!(repl.handle_line(":q").await.unwrap(), Step::Quit);
    }
}

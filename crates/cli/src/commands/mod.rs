// CLI subcommand dispatch.

use clap::Subcommand;
use serde::Serialize;

use crate::output::{self, OutputFormat};
use crate::workspace::GlobalOpts;

pub mod chat;
pub mod edit;
pub mod export;
pub mod history;
pub mod import;
pub mod ls;
pub mod open;
pub mod show;
pub mod transform;

#[derive(Subcommand)]
pub enum Command {
    /// Import a DOCX, PDF, DOC or TXT file as a new document
    Import(import::ImportArgs),
    /// List stored documents
    Ls(ls::LsArgs),
    /// Print a document's content
    Show(show::ShowArgs),
    /// Replace a document's content
    Edit(edit::EditArgs),
    /// Apply an inline action to a selection
    Transform(transform::TransformArgs),
    /// Ask the assistant about a document
    Chat(chat::ChatArgs),
    /// Show a document's chat history
    History(history::HistoryArgs),
    /// Export a document as HTML
    Export(export::ExportArgs),
    /// Open an interactive editing session
    Open(open::OpenArgs),
}

pub async fn run(cmd: Command, globals: &GlobalOpts) -> anyhow::Result<()> {
    match cmd {
        Command::Import(args) => import::run(args, globals).await,
        Command::Ls(args) => ls::run(args, globals).await,
        Command::Show(args) => show::run(args, globals).await,
        Command::Edit(args) => edit::run(args, globals).await,
        Command::Transform(args) => transform::run(args, globals).await,
        Command::Chat(args) => chat::run(args, globals).await,
        Command::History(args) => history::run(args, globals).await,
        Command::Export(args) => export::run(args, globals).await,
        Command::Open(args) => open::run(args, globals).await,
    }
}

/// Print a command's result, or its mapped error.
pub(crate) fn report<T, F>(format: OutputFormat, result: anyhow::Result<T>, human_fn: F) -> anyhow::Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match result {
        Ok(value) => {
            output::print_output(format, &value, human_fn)?;
            Ok(())
        }
        Err(e) => {
            output::print_anyhow_error(format, &e);
            Err(e)
        }
    }
}

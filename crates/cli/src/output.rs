// Output format auto-detection for the CLI.
//
// TTY → human-readable text. Piped/redirected → structured JSON.
// `--json` flag forces JSON output regardless of terminal.

use polysync_common::intent::{ActionId, UnknownActionError};
use polysync_engine::error::{EngineError, StoreError};
use polysync_engine::intake::IntakeError;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

const ANSI_RED: &str = "\x1b[31m";
const ANSI_YELLOW: &str = "\x1b[33m";
const ANSI_RESET: &str = "\x1b[0m";

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    Human,
    /// Machine-readable JSON (one object per response).
    Json,
}

impl OutputFormat {
    /// Auto-detect format: JSON if `--json` was passed or stdout is not a TTY.
    pub fn detect(json_flag: bool) -> Self {
        if json_flag {
            return Self::Json;
        }
        Self::detect_from_terminal(io::stdout().is_terminal())
    }

    /// Testable variant that takes an explicit `is_tty` flag.
    pub fn detect_from_terminal(is_tty: bool) -> Self {
        if is_tty {
            Self::Human
        } else {
            Self::Json
        }
    }
}

/// Write a value to stdout in the selected format.
pub fn print_output<T, F>(format: OutputFormat, value: &T, human_fn: F) -> io::Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    write_output(&mut io::stdout().lock(), format, value, human_fn)
}

/// Write a value to a provided writer.
pub fn write_output<W, T, F>(
    writer: &mut W,
    format: OutputFormat,
    value: &T,
    human_fn: F,
) -> io::Result<()>
where
    W: Write,
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Human => {
            writeln!(writer, "{}", human_fn(value))
        }
        OutputFormat::Json => {
            serde_json::to_writer(&mut *writer, value).map_err(io::Error::other)?;
            writeln!(writer)
        }
    }
}

/// Write an error to stderr in the selected format.
pub fn print_error(format: OutputFormat, code: &str, message: &str) {
    print_stderr(format, "error", code, message, ANSI_RED);
}

/// Write a warning to stderr in the selected format.
pub fn print_warning(format: OutputFormat, code: &str, message: &str) {
    print_stderr(format, "warning", code, message, ANSI_YELLOW);
}

fn print_stderr(format: OutputFormat, label: &str, code: &str, message: &str, color: &str) {
    let mut err = io::stderr().lock();
    match format {
        OutputFormat::Human => {
            let line = render_human_stderr_line(label, message, io::stderr().is_terminal(), color);
            let _ = writeln!(err, "{line}");
        }
        OutputFormat::Json => {
            let mut obj = serde_json::Map::new();
            obj.insert(label.to_string(), serde_json::json!({ "code": code, "message": message }));
            let _ = serde_json::to_writer(&mut err, &obj);
            let _ = writeln!(err);
        }
    }
}

/// Print a mapped, actionable error for a command failure.
pub fn print_anyhow_error(format: OutputFormat, error: &anyhow::Error) {
    let (code, message) = actionable_error(error);
    print_error(format, code, &message);
}

pub(crate) fn actionable_error(error: &anyhow::Error) -> (&'static str, String) {
    for cause in error.chain() {
        if let Some(engine) = cause.downcast_ref::<EngineError>() {
            let message = match engine {
                EngineError::NotFound(id) => format!(
                    "Document `{id}` not found. Run: polysync ls to see available documents"
                ),
                other => other.notice(),
            };
            return (engine.code(), message);
        }
        if let Some(store) = cause.downcast_ref::<StoreError>() {
            return ("SAVE_FAILED", format!("{store}"));
        }
        if let Some(intake) = cause.downcast_ref::<IntakeError>() {
            let code = match intake {
                IntakeError::UnsupportedType(_) => "INVALID_FILE_TYPE",
                IntakeError::TooLarge { .. } => "FILE_TOO_LARGE",
                IntakeError::NotUtf8 => "INVALID_TEXT",
                IntakeError::Io { .. } => "IO_ERROR",
                IntakeError::Store(_) => "SAVE_FAILED",
            };
            return (code, intake.to_string());
        }
        if let Some(UnknownActionError(id)) = cause.downcast_ref::<UnknownActionError>() {
            let known: Vec<&str> = ActionId::MENU.iter().map(|a| a.id()).collect();
            return (
                "UNKNOWN_ACTION",
                format!("Unknown action `{id}`. Choose one of: {}", known.join(", ")),
            );
        }
    }
    ("ERROR", format!("{error:#}"))
}

fn render_human_stderr_line(label: &str, message: &str, is_tty: bool, color: &str) -> String {
    if is_tty {
        format!("{color}{label}:{ANSI_RESET} {message}")
    } else {
        format!("{label}: {message}")
    }
}

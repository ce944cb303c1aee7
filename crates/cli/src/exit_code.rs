// Consistent exit codes for the polysync CLI.
//
//   0 = success
//   1 = general error
//   2 = usage/argument error
//   3 = document not found
//   4 = transform provider failed
//   5 = store read/write failed

use std::process;

use polysync_common::intent::UnknownActionError;
use polysync_engine::error::{EngineError, ProviderError, StoreError};
use polysync_engine::intake::IntakeError;

/// Named exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    Usage = 2,
    NotFound = 3,
    Provider = 4,
    Store = 5,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map an anyhow error to an exit code by inspecting the error chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(engine) = cause.downcast_ref::<EngineError>() {
                return Self::from_engine_code(engine.code());
            }
            if cause.is::<ProviderError>() {
                return Self::Provider;
            }
            if cause.is::<StoreError>() {
                return Self::Store;
            }
            if let Some(intake) = cause.downcast_ref::<IntakeError>() {
                return match intake {
                    IntakeError::Store(_) => Self::Store,
                    IntakeError::Io { .. } => Self::Error,
                    _ => Self::Usage,
                };
            }
            if cause.is::<UnknownActionError>() {
                return Self::Usage;
            }
        }
        Self::Error
    }

    /// Map an engine error code to an exit code.
    pub fn from_engine_code(code: &str) -> Self {
        match code {
            "DOCUMENT_NOT_FOUND" => Self::NotFound,
            "PROVIDER_FAILED" => Self::Provider,
            "SAVE_FAILED" => Self::Store,
            "VALIDATION_FAILED" => Self::Usage,
            _ => Self::Error,
        }
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code.code() as u8)
    }
}

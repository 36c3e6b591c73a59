//! CLI error types.

use std::path::PathBuf;

use rustyline::error::ReadlineError;
use thiserror::Error;
use zen_types::{SourceFile, ZenError};

/// Errors that end a `zen` invocation.
#[derive(Debug, Error)]
pub enum CliError {
    /// A file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A configuration file is not valid.
    #[error("invalid configuration in {}: {source}", path.display())]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The line editor failed.
    #[error("line editor error: {0}")]
    Readline(#[from] ReadlineError),

    /// The script raised a Zen error. `unit` is the script's own source.
    #[error("{error}")]
    Script { error: ZenError, unit: SourceFile },
}

/// CLI result type alias.
pub type CliResult<T> = Result<T, CliError>;

/// Format a Zen error for the terminal: a caret diagnostic, or one line of
/// JSON.
pub fn format_error(error: &ZenError, unit: &SourceFile, json: bool) -> String {
    if json {
        serde_json::to_string(error).unwrap_or_else(|_| error.to_string())
    } else {
        error.render(unit)
    }
}

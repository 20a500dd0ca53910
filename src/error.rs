use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TagError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tag file unavailable at {}: {source}", path.display())]
    IndexUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Tag generation failed ({status}): {}", failure_output(stderr, stdout))]
    GenerationFailed {
        status: String,
        stderr: String,
        stdout: String,
    },

    #[error("Could not update git hook {}: {source}", path.display())]
    HookWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Watcher error: {0}")]
    Watcher(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Diagnostic text of a failed run: stderr, or stdout when stderr is empty
fn failure_output<'a>(stderr: &'a str, stdout: &'a str) -> &'a str {
    match stderr.trim() {
        "" => stdout.trim(),
        text => text,
    }
}

/// A single tag line that could not be turned into a record.
///
/// These never abort a parse; the parser logs them and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseLineError {
    #[error("line {line}: expected at least 4 tab-separated fields, found {found}")]
    TooFewFields { line: usize, found: usize },

    #[error("line {line}: invalid line number {value:?}")]
    InvalidLineNumber { line: usize, value: String },

    #[error("line {line}: empty symbol name")]
    EmptyName { line: usize },
}

impl ParseLineError {
    pub fn line(&self) -> usize {
        match self {
            ParseLineError::TooFewFields { line, .. }
            | ParseLineError::InvalidLineNumber { line, .. }
            | ParseLineError::EmptyName { line } => *line,
        }
    }
}

pub type Result<T> = std::result::Result<T, TagError>;

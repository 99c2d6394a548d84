//! Domain-specific errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure taxonomy for every rejx operation.
///
/// `Configuration` aborts an invocation before any file is touched; the other
/// variants are per-file and end up recorded in that file's outcome.
#[derive(Debug, Error)]
pub enum RejxError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Conflict(#[from] Conflict),
    #[error("original file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl RejxError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Malformed `.rej` content. Line numbers are 1-based, hunk indices 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: expected a hunk header like `@@ -1,3 +1,3 @@`")]
    MissingHunkHeader { line: usize },
    #[error("line {line}: malformed hunk header `{header}`")]
    MalformedHeader { line: usize, header: String },
    #[error("line {line}: unknown line tag {tag:?}")]
    UnknownLineTag { line: usize, tag: char },
    #[error(
        "hunk #{}: header declares {expected_old} original / {expected_new} target lines, body has {found_old} / {found_new}",
        .hunk + 1
    )]
    LineCountMismatch {
        hunk: usize,
        expected_old: usize,
        expected_new: usize,
        found_old: usize,
        found_new: usize,
    },
    #[error("hunk #{} overlaps or precedes the previous hunk", .hunk + 1)]
    OutOfOrder { hunk: usize },
    #[error("line {line}: reject is not valid UTF-8")]
    InvalidUtf8 { line: usize },
}

/// A hunk whose context does not match the target at its expected position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("hunk #{} does not match the original at line {line}", .hunk + 1)]
pub struct Conflict {
    /// Index of the first hunk that failed to match.
    pub hunk: usize,
    /// 1-based line in the working copy where matching was attempted.
    pub line: usize,
    /// Number of hunks before `hunk` that matched.
    pub matched: usize,
    /// Total hunks in the reject.
    pub total: usize,
}

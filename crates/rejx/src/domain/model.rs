//! Domain models for reject files, hunks, and per-file outcomes.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::errors::{Conflict, RejxError};

/// File extension carried by reject fragments.
pub const REJECT_EXTENSION: &str = "rej";

/// A `.rej` file and the original it was rejected from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RejectFile {
    pub path: PathBuf,
    pub original: PathBuf,
}

impl RejectFile {
    /// Build from a path ending in `.rej`; the original is the same path with
    /// the suffix removed. Returns `None` for anything else.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        if !is_reject_path(&path) {
            return None;
        }
        let original = path.with_extension("");
        Some(Self { path, original })
    }

    pub fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    pub fn original_exists(&self) -> bool {
        self.original.is_file()
    }
}

/// Whether `path` names a reject fragment (`*.rej`, not a bare `.rej`).
pub fn is_reject_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == REJECT_EXTENSION)
}

/// Role of a line inside a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineTag {
    Context,
    Add,
    Remove,
}

impl LineTag {
    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            ' ' => Some(Self::Context),
            '+' => Some(Self::Add),
            '-' => Some(Self::Remove),
            _ => None,
        }
    }

    /// Present in the original (pre-image) side of the hunk.
    pub fn in_original(self) -> bool {
        !matches!(self, Self::Add)
    }

    /// Present in the target (post-image) side of the hunk.
    pub fn in_target(self) -> bool {
        !matches!(self, Self::Remove)
    }
}

/// One tagged line of a hunk, without its line terminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HunkLine {
    tag: LineTag,
    text: String,
    no_newline: bool,
}

impl HunkLine {
    pub fn new(tag: LineTag, text: impl Into<String>) -> Self {
        Self {
            tag,
            text: text.into(),
            no_newline: false,
        }
    }

    pub(crate) fn mark_no_newline(&mut self) {
        self.no_newline = true;
    }

    pub fn tag(&self) -> LineTag {
        self.tag
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Followed by `\ No newline at end of file` in the reject.
    pub fn no_newline(&self) -> bool {
        self.no_newline
    }
}

/// A contiguous patch unit anchored at a line range of the original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hunk {
    old_start: usize,
    old_len: usize,
    new_start: usize,
    new_len: usize,
    section: Option<String>,
    lines: Vec<HunkLine>,
}

impl Hunk {
    pub(crate) fn new(
        old_start: usize,
        old_len: usize,
        new_start: usize,
        new_len: usize,
        section: Option<String>,
        lines: Vec<HunkLine>,
    ) -> Self {
        Self {
            old_start,
            old_len,
            new_start,
            new_len,
            section,
            lines,
        }
    }

    pub fn old_start(&self) -> usize {
        self.old_start
    }

    pub fn old_len(&self) -> usize {
        self.old_len
    }

    pub fn new_start(&self) -> usize {
        self.new_start
    }

    pub fn new_len(&self) -> usize {
        self.new_len
    }

    /// Text following the closing `@@`, usually the enclosing function.
    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    pub fn lines(&self) -> &[HunkLine] {
        &self.lines
    }

    /// 0-based index of the first original line the hunk covers. A zero-length
    /// range names the line *after which* content is inserted.
    pub fn old_offset(&self) -> usize {
        if self.old_len == 0 {
            self.old_start
        } else {
            self.old_start.saturating_sub(1)
        }
    }

    /// 0-based index one past the last original line the hunk covers.
    pub fn old_end(&self) -> usize {
        self.old_offset() + self.old_len
    }

    /// Lines expected in the original file, in order.
    pub fn original_lines(&self) -> impl Iterator<Item = &HunkLine> {
        self.lines.iter().filter(|line| line.tag.in_original())
    }
}

/// Implemented by every per-file outcome so reports can summarise failures.
pub trait Outcome {
    fn is_failure(&self) -> bool;
    /// Short human label used in status lines.
    fn label(&self) -> &'static str;
}

/// Result of `fix` for one reject file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApplyOutcome {
    Applied { hunks: usize },
    /// A later hunk conflicted; `failed` lists it and every hunk after it.
    /// Nothing was written.
    PartiallyApplied { failed: Vec<usize> },
    NotFound { original: PathBuf },
    ParseError { message: String },
    ConflictError { hunk: usize, line: usize },
    IoError { message: String },
}

impl ApplyOutcome {
    /// Map an error raised while fixing one file onto its outcome.
    pub fn from_error(err: RejxError) -> Self {
        match err {
            RejxError::Parse(err) => Self::ParseError {
                message: err.to_string(),
            },
            RejxError::Conflict(conflict) => Self::from_conflict(conflict),
            RejxError::NotFound(original) => Self::NotFound { original },
            err @ (RejxError::Io { .. } | RejxError::Configuration(_)) => Self::IoError {
                message: err.to_string(),
            },
        }
    }

    fn from_conflict(conflict: Conflict) -> Self {
        if conflict.matched == 0 {
            Self::ConflictError {
                hunk: conflict.hunk,
                line: conflict.line,
            }
        } else {
            Self::PartiallyApplied {
                failed: (conflict.hunk..conflict.total).collect(),
            }
        }
    }
}

impl Outcome for ApplyOutcome {
    fn is_failure(&self) -> bool {
        !matches!(self, Self::Applied { .. })
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "applied",
            Self::PartiallyApplied { .. } => "partially applicable",
            Self::NotFound { .. } => "not found",
            Self::ParseError { .. } => "parse error",
            Self::ConflictError { .. } => "conflict",
            Self::IoError { .. } => "io error",
        }
    }
}

/// Result of `diff` for one reject file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DiffOutcome {
    Preview { diff: String },
    Unavailable { reason: String },
}

impl Outcome for DiffOutcome {
    fn is_failure(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Preview { .. } => "preview",
            Self::Unavailable { .. } => "unable to preview",
        }
    }
}

/// Result of `ls` for one reject file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ListOutcome {
    Ready { hunks: usize, original_exists: bool },
    Unparseable { reason: String },
}

impl Outcome for ListOutcome {
    fn is_failure(&self) -> bool {
        matches!(self, Self::Unparseable { .. })
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "ready",
            Self::Unparseable { .. } => "unable to preview",
        }
    }
}

/// Result of `clean` for one reject file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CleanOutcome {
    Deleted,
    WouldDelete,
    Failed { message: String },
}

impl Outcome for CleanOutcome {
    fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Deleted => "deleted",
            Self::WouldDelete => "would delete",
            Self::Failed { .. } => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn original_is_path_without_rej_suffix() {
        let reject = RejectFile::from_path("src/a.py.rej").expect("reject path");
        assert_eq!(reject.original, PathBuf::from("src/a.py"));

        let bare = RejectFile::from_path("Makefile.rej").expect("reject path");
        assert_eq!(bare.original, PathBuf::from("Makefile"));
    }

    #[test]
    fn non_reject_paths_are_rejected() {
        assert!(RejectFile::from_path("src/a.py").is_none());
        assert!(RejectFile::from_path(".rej").is_none());
        assert!(RejectFile::from_path("notes.rej.txt").is_none());
    }

    #[test]
    fn conflict_on_first_hunk_is_a_conflict_error() {
        let outcome = ApplyOutcome::from_error(RejxError::from(Conflict {
            hunk: 0,
            line: 3,
            matched: 0,
            total: 2,
        }));
        assert_eq!(outcome, ApplyOutcome::ConflictError { hunk: 0, line: 3 });
    }

    #[test]
    fn conflict_after_matching_hunks_lists_remaining_hunks() {
        let outcome = ApplyOutcome::from_error(RejxError::from(Conflict {
            hunk: 1,
            line: 9,
            matched: 1,
            total: 3,
        }));
        assert_eq!(
            outcome,
            ApplyOutcome::PartiallyApplied {
                failed: vec![1, 2]
            }
        );
        assert!(outcome.is_failure());
    }
}

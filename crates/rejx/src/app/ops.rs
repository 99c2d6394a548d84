//! Per-command workflows: fix, diff, list, and clean.
//!
//! Every operation resolves its targets once, runs an action per reject file,
//! and collects one outcome per file. A failing file never stops the batch;
//! only an invalid query (a configuration error) aborts before any file is
//! touched. Nothing here writes to the console.

use serde::Serialize;

use crate::app::discovery::DiscoveryQuery;
use crate::app::{apply, parse};
use crate::domain::errors::RejxError;
use crate::domain::model::{
    ApplyOutcome, CleanOutcome, DiffOutcome, ListOutcome, Outcome, RejectFile,
};
use crate::infra::fs;

/// User-facing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Fix,
    Diff,
    List,
    Clean,
}

/// Whether `clean` deletes or only reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanMode {
    #[default]
    Delete,
    Preview,
}

/// Outcome for a single reject file.
#[derive(Debug, Clone, Serialize)]
pub struct Entry<O> {
    pub reject: RejectFile,
    pub outcome: O,
}

/// Aggregated outcomes of one invocation, in discovery order.
#[derive(Debug, Clone, Serialize)]
pub struct Report<O> {
    pub operation: Operation,
    pub entries: Vec<Entry<O>>,
}

impl<O: Outcome> Report<O> {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn failures(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.outcome.is_failure())
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }
}

/// Apply every targeted reject to its original.
pub fn fix(query: &DiscoveryQuery) -> Result<Report<ApplyOutcome>, RejxError> {
    execute(Operation::Fix, query, fix_one)
}

/// Preview every targeted reject as a unified diff without writing.
pub fn diff(query: &DiscoveryQuery) -> Result<Report<DiffOutcome>, RejxError> {
    execute(Operation::Diff, query, diff_one)
}

/// Enumerate targeted rejects with a parse check.
pub fn list(query: &DiscoveryQuery) -> Result<Report<ListOutcome>, RejxError> {
    execute(Operation::List, query, list_one)
}

/// Delete targeted rejects, or report what would be deleted.
pub fn clean(query: &DiscoveryQuery, mode: CleanMode) -> Result<Report<CleanOutcome>, RejxError> {
    execute(Operation::Clean, query, |reject| clean_one(reject, mode))
}

fn execute<O, F>(
    operation: Operation,
    query: &DiscoveryQuery,
    mut action: F,
) -> Result<Report<O>, RejxError>
where
    O: Outcome,
    F: FnMut(&RejectFile) -> O,
{
    let span = tracing::debug_span!("operation", op = ?operation);
    let _guard = span.enter();

    let targets = query.resolve()?;
    tracing::debug!(targets = targets.len(), "executing");

    let entries: Vec<Entry<O>> = targets
        .into_iter()
        .map(|reject| {
            let outcome = action(&reject);
            tracing::debug!(
                path = %reject.path.display(),
                outcome = outcome.label(),
                "processed"
            );
            Entry { reject, outcome }
        })
        .collect();

    let report = Report { operation, entries };
    tracing::debug!(failures = report.failures(), "done");
    Ok(report)
}

/// Parse, apply, and atomically write one reject. The `.rej` itself is kept.
pub fn fix_one(reject: &RejectFile) -> ApplyOutcome {
    match propose(reject) {
        Ok(proposal) => match fs::write_atomic(&reject.original, &proposal.patched) {
            Ok(()) => {
                tracing::info!(
                    reject = %reject.path.display(),
                    original = %reject.original.display(),
                    hunks = proposal.hunks,
                    "applied"
                );
                ApplyOutcome::Applied {
                    hunks: proposal.hunks,
                }
            }
            Err(err) => ApplyOutcome::from_error(err),
        },
        Err(err) => {
            tracing::warn!(reject = %reject.path.display(), error = %err, "not applied");
            ApplyOutcome::from_error(err)
        }
    }
}

fn diff_one(reject: &RejectFile) -> DiffOutcome {
    match propose(reject) {
        Ok(proposal) => DiffOutcome::Preview {
            diff: unified_diff(reject, &proposal),
        },
        Err(err) => DiffOutcome::Unavailable {
            reason: err.to_string(),
        },
    }
}

fn list_one(reject: &RejectFile) -> ListOutcome {
    match parse::parse_file(&reject.path) {
        Ok(hunks) => ListOutcome::Ready {
            hunks: hunks.len(),
            original_exists: reject.original_exists(),
        },
        Err(err) => ListOutcome::Unparseable {
            reason: err.to_string(),
        },
    }
}

fn clean_one(reject: &RejectFile, mode: CleanMode) -> CleanOutcome {
    match mode {
        CleanMode::Preview => CleanOutcome::WouldDelete,
        CleanMode::Delete => match fs::remove(&reject.path) {
            Ok(()) => {
                tracing::info!(path = %reject.path.display(), "deleted");
                CleanOutcome::Deleted
            }
            Err(err) => CleanOutcome::Failed {
                message: err.to_string(),
            },
        },
    }
}

/// Original content alongside the content a successful fix would write.
#[derive(Debug)]
struct Proposal {
    original: String,
    patched: String,
    hunks: usize,
}

fn propose(reject: &RejectFile) -> Result<Proposal, RejxError> {
    let hunks = parse::parse_file(&reject.path)?;
    let original = fs::read_original(&reject.original)?;
    let patched = apply::apply(&original, &hunks)?;
    Ok(Proposal {
        original,
        patched,
        hunks: hunks.len(),
    })
}

fn unified_diff(reject: &RejectFile, proposal: &Proposal) -> String {
    let patch = diffy::create_patch(&proposal.original, &proposal.patched);
    let rendered = patch.to_string();
    let body = rendered
        .strip_prefix("--- original\n+++ modified\n")
        .unwrap_or(&rendered);
    format!(
        "--- {}\n+++ {}\n{}",
        reject.original.display(),
        reject.path.display(),
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;
    use std::path::Path;

    use anyhow::Result;

    use crate::app::discovery::DiscoveryOptions;

    const FOO_TO_BAR: &str = "--- a.py\n+++ a.py\n@@ -3,1 +3,1 @@\n-foo\n+bar\n";

    fn all_under(root: &Path) -> Result<DiscoveryQuery> {
        Ok(DiscoveryQuery::from_options(DiscoveryOptions {
            paths: vec![root.to_path_buf()],
            recursive: true,
            ..DiscoveryOptions::default()
        })?)
    }

    fn explicit(path: &Path) -> Result<DiscoveryQuery> {
        Ok(DiscoveryQuery::from_options(DiscoveryOptions {
            paths: vec![path.to_path_buf()],
            ..DiscoveryOptions::default()
        })?)
    }

    #[test]
    fn fix_applies_and_second_run_conflicts() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let original = temp.path().join("a.py");
        let reject = temp.path().join("a.py.rej");
        stdfs::write(&original, "x\ny\nfoo\nz\n")?;
        stdfs::write(&reject, FOO_TO_BAR)?;

        let report = fix(&explicit(&reject)?)?;
        assert!(report.is_success());
        assert_eq!(report.entries[0].outcome, ApplyOutcome::Applied { hunks: 1 });
        assert_eq!(stdfs::read_to_string(&original)?, "x\ny\nbar\nz\n");
        assert!(reject.exists());

        let report = fix(&explicit(&reject)?)?;
        assert_eq!(
            report.entries[0].outcome,
            ApplyOutcome::ConflictError { hunk: 0, line: 3 }
        );
        assert_eq!(stdfs::read_to_string(&original)?, "x\ny\nbar\nz\n");
        Ok(())
    }

    #[test]
    fn two_spellings_of_one_reject_apply_once() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        stdfs::create_dir_all(root.join("sub"))?;
        stdfs::write(root.join("a.py"), "x\ny\nfoo\nz\n")?;
        stdfs::write(root.join("a.py.rej"), FOO_TO_BAR)?;

        let query = DiscoveryQuery::from_options(DiscoveryOptions {
            paths: vec![root.join("a.py.rej"), root.join("sub/../a.py.rej")],
            ..DiscoveryOptions::default()
        })?;
        let report = fix(&query)?;
        assert_eq!(report.entries.len(), 1);
        assert!(report.is_success());
        assert_eq!(stdfs::read_to_string(root.join("a.py"))?, "x\ny\nbar\nz\n");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn fix_patches_the_target_of_a_symlinked_original() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        stdfs::write(root.join("real.py"), "x\ny\nfoo\nz\n")?;
        std::os::unix::fs::symlink(root.join("real.py"), root.join("a.py"))?;
        stdfs::write(root.join("a.py.rej"), FOO_TO_BAR)?;

        let report = fix(&explicit(&root.join("a.py.rej"))?)?;
        assert_eq!(report.entries[0].outcome, ApplyOutcome::Applied { hunks: 1 });
        assert!(stdfs::symlink_metadata(root.join("a.py"))?.file_type().is_symlink());
        assert_eq!(stdfs::read_to_string(root.join("real.py"))?, "x\ny\nbar\nz\n");
        Ok(())
    }

    #[test]
    fn one_malformed_reject_does_not_stop_the_batch() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        for name in ["one", "two", "three"] {
            stdfs::write(root.join(format!("{name}.txt")), "x\ny\nfoo\nz\n")?;
        }
        stdfs::write(root.join("one.txt.rej"), FOO_TO_BAR)?;
        stdfs::write(root.join("two.txt.rej"), "@@ -3,2 +3,2 @@\n-foo\n+bar\n")?;
        stdfs::write(root.join("three.txt.rej"), FOO_TO_BAR)?;

        let report = fix(&all_under(root)?)?;
        assert_eq!(report.entries.len(), 3);
        assert_eq!(report.failures(), 1);

        let broken = report
            .entries
            .iter()
            .find(|e| e.reject.path.ends_with("two.txt.rej"))
            .expect("two.txt.rej reported");
        assert!(matches!(broken.outcome, ApplyOutcome::ParseError { .. }));

        assert_eq!(stdfs::read_to_string(root.join("one.txt"))?, "x\ny\nbar\nz\n");
        assert_eq!(stdfs::read_to_string(root.join("three.txt"))?, "x\ny\nbar\nz\n");
        assert_eq!(stdfs::read_to_string(root.join("two.txt"))?, "x\ny\nfoo\nz\n");
        Ok(())
    }

    #[test]
    fn conflicting_later_hunk_leaves_original_untouched() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let original = temp.path().join("b.txt");
        let reject = temp.path().join("b.txt.rej");
        stdfs::write(&original, "a\nb\nc\nd\n")?;
        stdfs::write(&reject, "@@ -1 +1 @@\n-a\n+A\n@@ -4 +4 @@\n-nope\n+D\n")?;

        let report = fix(&explicit(&reject)?)?;
        assert_eq!(
            report.entries[0].outcome,
            ApplyOutcome::PartiallyApplied { failed: vec![1] }
        );
        assert_eq!(stdfs::read_to_string(&original)?, "a\nb\nc\nd\n");
        Ok(())
    }

    #[test]
    fn missing_original_is_reported_as_not_found() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let reject = temp.path().join("gone.cfg.rej");
        stdfs::write(&reject, FOO_TO_BAR)?;

        let report = fix(&explicit(&reject)?)?;
        assert_eq!(
            report.entries[0].outcome,
            ApplyOutcome::NotFound {
                original: temp.path().join("gone.cfg")
            }
        );
        Ok(())
    }

    #[test]
    fn diff_previews_without_writing() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        stdfs::write(root.join("a.py"), "x\ny\nfoo\nz\n")?;
        stdfs::write(root.join("a.py.rej"), FOO_TO_BAR)?;
        stdfs::write(root.join("bad.py"), "x\n")?;
        stdfs::write(root.join("bad.py.rej"), "garbage\n")?;

        let report = diff(&all_under(root)?)?;
        assert_eq!(report.entries.len(), 2);

        match &report.entries[0].outcome {
            DiffOutcome::Preview { diff } => {
                assert!(diff.starts_with(&format!("--- {}", root.join("a.py").display())));
                assert!(diff.contains("-foo\n"));
                assert!(diff.contains("+bar\n"));
            }
            other => panic!("expected preview, got {other:?}"),
        }
        assert!(matches!(
            report.entries[1].outcome,
            DiffOutcome::Unavailable { .. }
        ));
        assert_eq!(stdfs::read_to_string(root.join("a.py"))?, "x\ny\nfoo\nz\n");
        Ok(())
    }

    #[test]
    fn list_marks_unparseable_rejects() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        stdfs::write(root.join("a.py.rej"), FOO_TO_BAR)?;
        stdfs::write(root.join("b.py.rej"), "not a hunk\n")?;

        let report = list(&all_under(root)?)?;
        assert_eq!(
            report.entries[0].outcome,
            ListOutcome::Ready {
                hunks: 1,
                original_exists: false
            }
        );
        assert!(matches!(
            report.entries[1].outcome,
            ListOutcome::Unparseable { .. }
        ));
        Ok(())
    }

    #[test]
    fn clean_preview_keeps_files_and_delete_removes_them() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        stdfs::write(root.join("a.py.rej"), FOO_TO_BAR)?;
        stdfs::create_dir_all(root.join("sub"))?;
        stdfs::write(root.join("sub/b.py.rej"), FOO_TO_BAR)?;

        let query = all_under(root)?;
        let preview = clean(&query, CleanMode::Preview)?;
        assert_eq!(preview.entries.len(), 2);
        assert!(
            preview
                .entries
                .iter()
                .all(|e| e.outcome == CleanOutcome::WouldDelete)
        );
        assert!(root.join("a.py.rej").exists());

        let deleted = clean(&query, CleanMode::Delete)?;
        assert!(deleted.is_success());
        assert!(!root.join("a.py.rej").exists());
        assert!(!root.join("sub/b.py.rej").exists());
        Ok(())
    }
}

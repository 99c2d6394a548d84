//! Renders reports as plain or coloured text, or JSON.

use std::io::{self, Write};

use anyhow::{Context, Result};
use crossterm::style::{Color, Stylize};
use serde::Serialize;

use crate::app::ops::{Entry, Report};
use crate::domain::model::{ApplyOutcome, CleanOutcome, DiffOutcome, ListOutcome, Outcome};
use crate::ui::View;
use crate::ui::tree::TreeNode;

const TREE_TITLE: &str = "Rejected files";
const NOTHING_FOUND: &str = "No .rej files found";

/// Writes human-readable reports to any writer.
pub struct Presenter<W: Write> {
    out: W,
    color: bool,
}

impl<W: Write> Presenter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn fix_report(&mut self, report: &Report<ApplyOutcome>) -> io::Result<()> {
        if report.is_empty() {
            return writeln!(self.out, "{NOTHING_FOUND}");
        }
        for entry in &report.entries {
            let detail = match &entry.outcome {
                ApplyOutcome::Applied { hunks } => format!(
                    "{} ({} {})",
                    entry.reject.original.display(),
                    hunks,
                    plural(*hunks, "hunk", "hunks")
                ),
                ApplyOutcome::PartiallyApplied { failed } => format!(
                    "hunk {} conflicts, {} not written",
                    hunk_list(failed),
                    entry.reject.original.display()
                ),
                ApplyOutcome::NotFound { original } => {
                    format!("original {} is missing", original.display())
                }
                ApplyOutcome::ParseError { message } | ApplyOutcome::IoError { message } => {
                    message.clone()
                }
                ApplyOutcome::ConflictError { hunk, line } => format!(
                    "hunk #{} does not match {} at line {}",
                    hunk + 1,
                    entry.reject.original.display(),
                    line
                ),
            };
            self.status(entry, &detail)?;
        }
        self.summary(report, "applied")
    }

    pub fn diff_report(&mut self, report: &Report<DiffOutcome>) -> io::Result<()> {
        if report.is_empty() {
            return writeln!(self.out, "{NOTHING_FOUND}");
        }
        for entry in &report.entries {
            let title = self.paint(&format!("── {} ", entry.reject.display_path()), Color::Blue);
            writeln!(self.out, "{title}")?;
            match &entry.outcome {
                DiffOutcome::Preview { diff } => {
                    for line in diff.lines() {
                        let color = match line.chars().next() {
                            Some('+') if !line.starts_with("+++") => Some(Color::Green),
                            Some('-') if !line.starts_with("---") => Some(Color::Red),
                            Some('@') => Some(Color::Cyan),
                            _ => None,
                        };
                        let line = match color {
                            Some(color) => self.paint(line, color),
                            None => line.to_owned(),
                        };
                        writeln!(self.out, "{line}")?;
                    }
                }
                DiffOutcome::Unavailable { reason } => {
                    let label = self.paint(entry.outcome.label(), Color::Yellow);
                    writeln!(self.out, "{label}: {reason}")?;
                }
            }
        }
        Ok(())
    }

    pub fn list_report(&mut self, report: &Report<ListOutcome>, view: View) -> io::Result<()> {
        if report.is_empty() {
            return writeln!(self.out, "{NOTHING_FOUND}");
        }
        match view {
            View::List => {
                for entry in &report.entries {
                    let path = entry.reject.display_path();
                    match &entry.outcome {
                        ListOutcome::Ready {
                            original_exists: true,
                            ..
                        } => writeln!(self.out, "{path}")?,
                        ListOutcome::Ready {
                            original_exists: false,
                            ..
                        } => {
                            let note = self.paint("(original missing)", Color::Yellow);
                            writeln!(self.out, "{path}  {note}")?
                        }
                        ListOutcome::Unparseable { reason } => {
                            let note = self.paint(entry.outcome.label(), Color::Yellow);
                            writeln!(self.out, "{path}  ({note}: {reason})")?
                        }
                    }
                }
            }
            View::Tree => {
                let tree =
                    TreeNode::from_paths(report.entries.iter().map(|e| e.reject.path.as_path()));
                let title = self.paint(TREE_TITLE, Color::Blue);
                writeln!(self.out, "{title}")?;
                for line in tree.lines() {
                    let name = if line.is_dir {
                        self.paint(&line.name, Color::Blue)
                    } else {
                        line.name.clone()
                    };
                    writeln!(self.out, "{}{}", line.prefix, name)?;
                }
            }
        }
        Ok(())
    }

    pub fn clean_report(&mut self, report: &Report<CleanOutcome>) -> io::Result<()> {
        if report.is_empty() {
            return writeln!(self.out, "{NOTHING_FOUND}");
        }
        let previewing = report
            .entries
            .iter()
            .any(|entry| entry.outcome == CleanOutcome::WouldDelete);
        if previewing {
            let header = self.paint("These files will be deleted:", Color::Red);
            writeln!(self.out, "{header}")?;
            for entry in &report.entries {
                writeln!(self.out, " - {}", entry.reject.display_path())?;
            }
            return writeln!(self.out, "Run without --preview to delete them.");
        }
        for entry in &report.entries {
            let detail = match &entry.outcome {
                CleanOutcome::Failed { message } => message.clone(),
                _ => String::new(),
            };
            self.status(entry, &detail)?;
        }
        self.summary(report, "deleted")
    }

    /// Serialize any report as pretty JSON followed by a newline.
    pub fn json<T: Serialize>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.out, value).context("failed to serialize report")?;
        writeln!(self.out)?;
        Ok(())
    }

    fn status<O: Outcome>(&mut self, entry: &Entry<O>, detail: &str) -> io::Result<()> {
        let color = if entry.outcome.is_failure() {
            Color::Red
        } else {
            Color::Green
        };
        let label = self.paint(&format!("{:>20}", entry.outcome.label()), color);
        let path = entry.reject.display_path();
        if detail.is_empty() {
            writeln!(self.out, "{label}  {path}")
        } else {
            writeln!(self.out, "{label}  {path}: {detail}")
        }
    }

    fn summary<O: Outcome>(&mut self, report: &Report<O>, verb: &str) -> io::Result<()> {
        let total = report.entries.len();
        let failed = report.failures();
        let line = format!(
            "{total} {}: {} {verb}, {failed} failed",
            plural(total, "file", "files"),
            total - failed
        );
        let color = if failed == 0 { Color::Green } else { Color::Red };
        let line = self.paint(&line, color);
        writeln!(self.out, "{line}")
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.with(color).bold().to_string()
        } else {
            text.to_owned()
        }
    }
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}

fn hunk_list(indices: &[usize]) -> String {
    indices
        .iter()
        .map(|index| format!("#{}", index + 1))
        .collect::<Vec<_>>()
        .join(", ")
}

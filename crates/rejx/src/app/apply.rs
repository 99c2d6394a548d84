//! Applies parsed hunks to the content of an original file.
//!
//! Matching is exact: every context and removed line must appear verbatim at
//! the hunk's declared position, shifted only by the line delta of the hunks
//! applied before it. There is no offset search and no fuzz.

use crate::domain::errors::Conflict;
use crate::domain::model::{Hunk, LineTag};

/// Apply `hunks` to `original`, returning the patched content.
///
/// Either every hunk applies or a [`Conflict`] naming the first failing hunk
/// is returned; callers never see a half-patched buffer.
pub fn apply(original: &str, hunks: &[Hunk]) -> Result<String, Conflict> {
    let eol = line_ending(original);
    let mut buffer: Vec<String> = original.split_inclusive('\n').map(str::to_owned).collect();
    let mut delta: isize = 0;

    for (index, hunk) in hunks.iter().enumerate() {
        let conflict = |at: usize| Conflict {
            hunk: index,
            line: at + 1,
            matched: index,
            total: hunks.len(),
        };

        let at = isize::try_from(hunk.old_offset())
            .ok()
            .and_then(|offset| offset.checked_add(delta))
            .and_then(|shifted| usize::try_from(shifted).ok())
            .ok_or_else(|| conflict(hunk.old_offset()))?;
        if !matches_at(&buffer, at, hunk) {
            return Err(conflict(at));
        }

        let replacement = replacement_lines(&buffer[at..at + hunk.old_len()], hunk, eol);
        buffer.splice(at..at + hunk.old_len(), replacement);
        delta += hunk.new_len() as isize - hunk.old_len() as isize;
    }

    let last = buffer.len().saturating_sub(1);
    for line in buffer.iter_mut().take(last) {
        if !line.ends_with('\n') {
            line.push_str(eol);
        }
    }

    Ok(buffer.concat())
}

/// Dominant line ending of `text`, judged by its first terminated line.
pub fn line_ending(text: &str) -> &'static str {
    match text.find('\n') {
        Some(pos) if text[..pos].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

fn matches_at(buffer: &[String], at: usize, hunk: &Hunk) -> bool {
    let Some(window) = at
        .checked_add(hunk.old_len())
        .and_then(|end| buffer.get(at..end))
    else {
        return false;
    };
    window
        .iter()
        .zip(hunk.original_lines())
        .all(|(actual, expected)| strip_eol(actual) == expected.text())
}

fn replacement_lines(window: &[String], hunk: &Hunk, eol: &str) -> Vec<String> {
    let mut originals = window.iter();
    let mut out = Vec::with_capacity(hunk.new_len());
    for line in hunk.lines() {
        match line.tag() {
            LineTag::Context => {
                if let Some(kept) = originals.next() {
                    out.push(kept.clone());
                }
            }
            LineTag::Remove => {
                originals.next();
            }
            LineTag::Add => {
                let mut text = line.text().to_owned();
                if !line.no_newline() {
                    text.push_str(eol);
                }
                out.push(text);
            }
        }
    }
    out
}

fn strip_eol(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

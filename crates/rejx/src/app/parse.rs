//! Parser for the unified-diff hunks stored in `.rej` files.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::errors::{ParseError, RejxError};
use crate::domain::model::{Hunk, HunkLine, LineTag};

static HUNK_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@(.*)$").expect("hunk header regex")
});

/// File-level lines written by `patch` and `git apply --reject` ahead of the
/// first hunk.
const PREAMBLE_PREFIXES: &[&str] = &["diff ", "index ", "--- ", "+++ ", "Index: ", "==="];

/// Largest line number a header may address; keeps offset arithmetic in range.
const MAX_LINE: usize = isize::MAX as usize;

/// Read and parse the reject at `path`.
pub fn parse_file(path: &Path) -> Result<Vec<Hunk>, RejxError> {
    let bytes = fs::read(path)
        .map_err(|err| RejxError::io(format!("failed to read {}", path.display()), err))?;
    let text = String::from_utf8(bytes).map_err(|err| {
        let valid = &err.as_bytes()[..err.utf8_error().valid_up_to()];
        let line = valid.iter().filter(|&&byte| byte == b'\n').count() + 1;
        ParseError::InvalidUtf8 { line }
    })?;
    Ok(parse(&text)?)
}

/// Parse reject text into hunks ordered by original position.
pub fn parse(text: &str) -> Result<Vec<Hunk>, ParseError> {
    let mut hunks = Vec::new();
    let mut current: Option<HunkBuilder> = None;
    let mut last_line = 0;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        last_line = line_no;
        let raw = raw.strip_suffix('\r').unwrap_or(raw);

        if raw.starts_with("@@") {
            if let Some(builder) = current.take() {
                hunks.push(builder.finish(hunks.len())?);
            }
            current = Some(HunkBuilder::from_header(raw, line_no)?);
            continue;
        }

        match current.as_mut() {
            Some(builder) => builder.push(raw, line_no)?,
            None if is_preamble(raw) => {}
            None => return Err(ParseError::MissingHunkHeader { line: line_no }),
        }
    }

    match current {
        Some(builder) => hunks.push(builder.finish(hunks.len())?),
        None => {
            return Err(ParseError::MissingHunkHeader {
                line: last_line + 1,
            });
        }
    }

    for (index, pair) in hunks.windows(2).enumerate() {
        if pair[1].old_offset() < pair[0].old_end() {
            return Err(ParseError::OutOfOrder { hunk: index + 1 });
        }
    }

    Ok(hunks)
}

fn is_preamble(line: &str) -> bool {
    line.trim().is_empty() || PREAMBLE_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

#[derive(Debug)]
struct HunkBuilder {
    old_start: usize,
    old_len: usize,
    new_start: usize,
    new_len: usize,
    section: Option<String>,
    lines: Vec<HunkLine>,
    old_seen: usize,
    new_seen: usize,
}

impl HunkBuilder {
    fn from_header(header: &str, line: usize) -> Result<Self, ParseError> {
        let malformed = || ParseError::MalformedHeader {
            line,
            header: header.to_owned(),
        };
        let caps = HUNK_HEADER.captures(header).ok_or_else(malformed)?;
        let number = |group: usize, default: usize| -> Result<usize, ParseError> {
            match caps.get(group) {
                Some(m) => m.as_str().parse().map_err(|_| malformed()),
                None => Ok(default),
            }
        };

        let section = caps
            .get(5)
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
            .map(str::to_owned);

        let (old_start, old_len) = (number(1, 0)?, number(2, 1)?);
        let (new_start, new_len) = (number(3, 0)?, number(4, 1)?);
        let in_range =
            |start: usize, len: usize| start.checked_add(len).is_some_and(|end| end <= MAX_LINE);
        if !in_range(old_start, old_len) || !in_range(new_start, new_len) {
            return Err(malformed());
        }

        Ok(Self {
            old_start,
            old_len,
            new_start,
            new_len,
            section,
            lines: Vec::new(),
            old_seen: 0,
            new_seen: 0,
        })
    }

    fn is_complete(&self) -> bool {
        self.old_seen >= self.old_len && self.new_seen >= self.new_len
    }

    fn push(&mut self, raw: &str, line: usize) -> Result<(), ParseError> {
        if self.is_complete() && is_preamble(raw) {
            return Ok(());
        }

        let mut chars = raw.chars();
        let Some(prefix) = chars.next() else {
            // Some editors strip the lone space of an empty context line.
            self.record(HunkLine::new(LineTag::Context, ""));
            return Ok(());
        };

        if prefix == '\\' {
            if let Some(last) = self.lines.last_mut() {
                last.mark_no_newline();
            }
            return Ok(());
        }

        let tag = LineTag::from_prefix(prefix)
            .ok_or(ParseError::UnknownLineTag { line, tag: prefix })?;
        self.record(HunkLine::new(tag, chars.as_str()));
        Ok(())
    }

    fn record(&mut self, line: HunkLine) {
        if line.tag().in_original() {
            self.old_seen += 1;
        }
        if line.tag().in_target() {
            self.new_seen += 1;
        }
        self.lines.push(line);
    }

    fn finish(self, index: usize) -> Result<Hunk, ParseError> {
        if self.old_seen != self.old_len || self.new_seen != self.new_len {
            return Err(ParseError::LineCountMismatch {
                hunk: index,
                expected_old: self.old_len,
                expected_new: self.new_len,
                found_old: self.old_seen,
                found_new: self.new_seen,
            });
        }
        Ok(Hunk::new(
            self.old_start,
            self.old_len,
            self.new_start,
            self.new_len,
            self.section,
            self.lines,
        ))
    }
}

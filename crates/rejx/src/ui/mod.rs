//! Text presentation of operation reports.

pub mod pager;
pub mod render;
pub mod tree;

use std::str::FromStr;

use clap::ValueEnum;

/// Layout used by `ls`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum View {
    /// One path per line.
    #[default]
    List,
    /// Paths grouped by directory.
    Tree,
}

impl FromStr for View {
    type Err = ViewParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "list" | "ls" => Ok(View::List),
            "tree" => Ok(View::Tree),
            other => Err(ViewParseError::UnknownView(other.to_string())),
        }
    }
}

/// Error returned when parsing a [`View`] fails.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ViewParseError {
    #[error("unknown view '{0}', expected 'list' or 'tree'")]
    UnknownView(String),
}

//! Discovery of `.rej` files from explicit paths or recursive searches.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use regex::Regex;

use crate::domain::errors::RejxError;
use crate::domain::model::{RejectFile, is_reject_path};

/// Whether dot-prefixed path segments below a search root are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HiddenPolicy {
    #[default]
    Exclude,
    Include,
}

impl HiddenPolicy {
    /// Resolve the `--include-hidden` / `--exclude-hidden` pair against a default.
    pub fn from_flags(include: bool, exclude: bool, default: Self) -> Result<Self, RejxError> {
        match (include, exclude) {
            (true, true) => Err(RejxError::config(
                "--include-hidden and --exclude-hidden are mutually exclusive",
            )),
            (true, false) => Ok(Self::Include),
            (false, true) => Ok(Self::Exclude),
            (false, false) => Ok(default),
        }
    }
}

/// How the paths of a query are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Every path must name a `.rej` file.
    Explicit,
    /// Directories are walked; `.rej` files are taken as-is.
    Recursive,
}

/// Raw discovery inputs gathered from the command line and configuration.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    pub paths: Vec<PathBuf>,
    pub recursive: bool,
    pub include_hidden: bool,
    pub exclude_hidden: bool,
    pub default_hidden: HiddenPolicy,
    /// Regular expressions matched against the displayed path.
    pub ignore_patterns: Vec<String>,
    /// Globs matched against the path relative to its search root.
    pub ignore_globs: Vec<String>,
}

/// A validated, immutable description of which reject files to operate on.
#[derive(Debug, Clone)]
pub struct DiscoveryQuery {
    roots: Vec<PathBuf>,
    mode: SelectionMode,
    hidden: HiddenPolicy,
    ignore: IgnoreMatcher,
}

impl DiscoveryQuery {
    /// Validate `options` without touching any file beyond existence checks.
    pub fn from_options(options: DiscoveryOptions) -> Result<Self, RejxError> {
        let hidden = HiddenPolicy::from_flags(
            options.include_hidden,
            options.exclude_hidden,
            options.default_hidden,
        )?;

        let mode = if options.recursive {
            SelectionMode::Recursive
        } else {
            SelectionMode::Explicit
        };

        let roots = match (mode, options.paths.is_empty()) {
            (SelectionMode::Recursive, true) => vec![PathBuf::from(".")],
            (SelectionMode::Explicit, true) => {
                return Err(RejxError::config(
                    "no reject files given; pass paths or use --all",
                ));
            }
            (_, false) => options.paths,
        };

        for root in &roots {
            validate_root(root, mode)?;
        }

        let ignore = IgnoreMatcher::new(&options.ignore_patterns, &options.ignore_globs)?;

        Ok(Self {
            roots,
            mode,
            hidden,
            ignore,
        })
    }

    /// Resolve the query into reject files sorted by path.
    ///
    /// Each file appears once even when several roots or spellings reach it;
    /// the first spelling encountered is the one reported.
    pub fn resolve(&self) -> Result<Vec<RejectFile>, RejxError> {
        let mut found = Targets::default();
        for root in &self.roots {
            if root.is_dir() {
                self.walk(root, &mut found);
            } else {
                found.insert(clean_path(root));
            }
        }
        tracing::debug!(count = found.files.len(), "resolved reject files");
        Ok(found.files.into_iter().collect())
    }

    fn walk(&self, root: &Path, found: &mut Targets) {
        let mut builder = WalkBuilder::new(root);
        builder
            .standard_filters(false)
            .hidden(self.hidden == HiddenPolicy::Exclude)
            .follow_links(false);

        for result in builder.build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(error = %err, root = %root.display(), "discovery error");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let path = clean_path(entry.path());
            if !is_reject_path(&path) {
                continue;
            }
            let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
            if self.ignore.should_skip(&path, rel) {
                tracing::debug!(path = %path.display(), "ignored");
                continue;
            }
            found.insert(path);
        }
    }
}

/// Reject files keyed by their canonical location.
#[derive(Debug, Default)]
struct Targets {
    seen: HashSet<PathBuf>,
    files: BTreeSet<RejectFile>,
}

impl Targets {
    fn insert(&mut self, path: PathBuf) {
        let key = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        if !self.seen.insert(key) {
            tracing::debug!(path = %path.display(), "duplicate target skipped");
            return;
        }
        if let Some(reject) = RejectFile::from_path(path) {
            self.files.insert(reject);
        }
    }
}

fn validate_root(root: &Path, mode: SelectionMode) -> Result<(), RejxError> {
    if !root.exists() {
        return Err(RejxError::config(format!(
            "path does not exist: {}",
            root.display()
        )));
    }
    if root.is_dir() {
        return match mode {
            SelectionMode::Recursive => Ok(()),
            SelectionMode::Explicit => Err(RejxError::config(format!(
                "{} is a directory; pass --all to search it",
                root.display()
            ))),
        };
    }
    if !is_reject_path(root) {
        return Err(RejxError::config(format!(
            "not a reject file: {}",
            root.display()
        )));
    }
    Ok(())
}

/// Drop a leading `./` so paths print the way users typed them.
fn clean_path(path: &Path) -> PathBuf {
    let mut components = path.components().peekable();
    while components.peek() == Some(&Component::CurDir) {
        components.next();
    }
    let cleaned: PathBuf = components.collect();
    if cleaned.as_os_str().is_empty() {
        path.to_path_buf()
    } else {
        cleaned
    }
}

#[derive(Debug, Clone, Default)]
struct IgnoreMatcher {
    patterns: Vec<Regex>,
    globs: Option<GlobSet>,
}

impl IgnoreMatcher {
    fn new(patterns: &[String], globs: &[String]) -> Result<Self, RejxError> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|err| {
                    RejxError::config(format!("invalid ignore pattern `{pattern}`: {err}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let globs = if globs.is_empty() {
            None
        } else {
            let mut builder = GlobSetBuilder::new();
            for raw in globs {
                for expanded in expand_dir_pattern(raw) {
                    let glob = Glob::new(&expanded).map_err(|err| {
                        RejxError::config(format!("invalid ignore glob `{raw}`: {err}"))
                    })?;
                    builder.add(glob);
                }
            }
            let set = builder
                .build()
                .map_err(|err| RejxError::config(format!("invalid ignore globs: {err}")))?;
            Some(set)
        };

        Ok(Self { patterns, globs })
    }

    fn should_skip(&self, display: &Path, rel: &Path) -> bool {
        let shown = display.to_string_lossy();
        self.patterns.iter().any(|re| re.is_match(&shown))
            || self.globs.as_ref().is_some_and(|set| set.is_match(rel))
    }
}

/// `build/` style entries ignore the directory at any depth.
fn expand_dir_pattern(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    match trimmed.strip_suffix('/') {
        Some(dir) => {
            let dir = dir.trim_start_matches('/');
            vec![format!("{dir}/**"), format!("**/{dir}/**")]
        }
        None => vec![trimmed.to_owned(), format!("**/{trimmed}")],
    }
}

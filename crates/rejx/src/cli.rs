//! Command-line interface and the command → handler mapping.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::app::discovery::{DiscoveryOptions, DiscoveryQuery};
use crate::app::ops::{self, CleanMode};
use crate::infra::config::Config;
use crate::ui::render::Presenter;
use crate::ui::{View, pager};

const ABOUT: &str = "Fix and resolve rej files as one would expect it";

#[derive(Debug, Parser)]
#[command(name = "rejx", version, about = ABOUT, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print the report as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Write `diff` output straight to stdout instead of through $PAGER
    #[arg(long, global = true)]
    pub no_pager: bool,
}

/// Flags shared by every command that discovers reject files.
#[derive(Debug, Clone, Default, Args)]
pub struct DiscoveryArgs {
    /// Also search dot-prefixed files and directories
    #[arg(long, conflicts_with = "exclude_hidden")]
    pub include_hidden: bool,

    /// Skip dot-prefixed files and directories (default)
    #[arg(long)]
    pub exclude_hidden: bool,

    /// Skip paths matching this regular expression (repeatable)
    #[arg(long = "ignore", value_name = "REGEX")]
    pub ignore: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply reject files to their original files
    Fix {
        /// Reject files, or directories to search with --all
        #[arg(value_name = "PATH")]
        paths: Vec<PathBuf>,
        /// Apply every reject file found under PATH (default: current directory)
        #[arg(long)]
        all: bool,
        #[command(flatten)]
        discovery: DiscoveryArgs,
    },
    /// Show what applying reject files would change
    Diff {
        #[arg(value_name = "PATH")]
        paths: Vec<PathBuf>,
        #[command(flatten)]
        discovery: DiscoveryArgs,
    },
    /// List reject files
    #[command(alias = "list")]
    Ls {
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
        /// Layout of the listing
        #[arg(long, value_enum)]
        view: Option<View>,
        #[command(flatten)]
        discovery: DiscoveryArgs,
    },
    /// List reject files as a directory tree
    Tree {
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
        #[command(flatten)]
        discovery: DiscoveryArgs,
    },
    /// Delete reject files
    Clean {
        #[arg(value_name = "PATH")]
        paths: Vec<PathBuf>,
        /// Delete every reject file found under PATH (default: current directory)
        #[arg(long)]
        all: bool,
        /// Only list the files that would be deleted
        #[arg(long)]
        preview: bool,
        #[command(flatten)]
        discovery: DiscoveryArgs,
    },
    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl DiscoveryArgs {
    fn query(
        &self,
        paths: Vec<PathBuf>,
        recursive: bool,
        config: &Config,
    ) -> Result<DiscoveryQuery> {
        let mut ignore_patterns = config.ignore.patterns.clone();
        ignore_patterns.extend(self.ignore.iter().cloned());

        let options = DiscoveryOptions {
            paths,
            recursive,
            include_hidden: self.include_hidden,
            exclude_hidden: self.exclude_hidden,
            default_hidden: config.defaults.hidden_policy(),
            ignore_patterns,
            ignore_globs: config.ignore.globs.clone(),
        };
        Ok(DiscoveryQuery::from_options(options)?)
    }
}

/// How reports reach the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Terminal {
    pub color: bool,
    /// Send `diff` output through the pager.
    pub page: bool,
}

/// Dispatch `cli` to its handler and render the report to `out`.
///
/// Returns exit code 1 when `fix` or `clean` had a failing target. Errors are
/// invocation-level (bad flags, unreadable config, broken output) and should
/// exit with code 2.
pub fn run<W: Write>(
    cli: Cli,
    config: &Config,
    out: W,
    terminal: Terminal,
) -> Result<ExitCode> {
    let Terminal { color, page } = terminal;
    let json = cli.json;
    let mut presenter = Presenter::new(out, color);

    let success = match cli.command {
        Command::Fix {
            paths,
            all,
            discovery,
        } => {
            let report = ops::fix(&discovery.query(paths, all, config)?)?;
            if json {
                presenter.json(&report)?;
            } else {
                presenter.fix_report(&report)?;
            }
            report.is_success()
        }
        Command::Diff { paths, discovery } => {
            let report = ops::diff(&discovery.query(paths, true, config)?)?;
            if json {
                presenter.json(&report)?;
            } else if page && !report.is_empty() {
                let mut paged = Presenter::new(Vec::new(), color);
                paged.diff_report(&report)?;
                pager::page(&paged.into_inner()).context("failed to run pager")?;
            } else {
                presenter.diff_report(&report)?;
            }
            true
        }
        Command::Ls {
            path,
            view,
            discovery,
        } => {
            let view = match view {
                Some(view) => view,
                None => config
                    .defaults
                    .view()
                    .parse()
                    .context("invalid `defaults.view` in configuration")?,
            };
            list(&mut presenter, json, path, view, &discovery, config)?;
            true
        }
        Command::Tree { path, discovery } => {
            list(&mut presenter, json, path, View::Tree, &discovery, config)?;
            true
        }
        Command::Clean {
            paths,
            all,
            preview,
            discovery,
        } => {
            let mode = if preview {
                CleanMode::Preview
            } else {
                CleanMode::Delete
            };
            let report = ops::clean(&discovery.query(paths, all, config)?, mode)?;
            if json {
                presenter.json(&report)?;
            } else {
                presenter.clean_report(&report)?;
            }
            report.is_success()
        }
        Command::Completions { shell } => {
            let mut out = presenter.into_inner();
            clap_complete::generate(shell, &mut Cli::command(), "rejx", &mut out);
            true
        }
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn list<W: Write>(
    presenter: &mut Presenter<W>,
    json: bool,
    path: Option<PathBuf>,
    view: View,
    discovery: &DiscoveryArgs,
    config: &Config,
) -> Result<()> {
    let paths = path.into_iter().collect();
    let report = ops::list(&discovery.query(paths, true, config)?)?;
    if json {
        presenter.json(&report)?;
    } else {
        presenter.list_report(&report, view)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn hidden_flags_conflict() {
        let result = Cli::try_parse_from(["rejx", "ls", "--include-hidden", "--exclude-hidden"]);
        assert!(result.is_err());
    }

    #[test]
    fn tree_is_a_separate_command() {
        let cli = Cli::try_parse_from(["rejx", "tree", "src"]).expect("parses");
        assert!(matches!(cli.command, Command::Tree { path: Some(_), .. }));
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from(["rejx", "fix", "--all", "-vv", "--json"]).expect("parses");
        assert_eq!(cli.verbose, 2);
        assert!(cli.json);
    }

    #[test]
    fn no_pager_is_global() {
        let cli = Cli::try_parse_from(["rejx", "diff", "--no-pager"]).expect("parses");
        assert!(cli.no_pager);
    }

    #[test]
    fn diff_without_paging_writes_to_output() -> Result<()> {
        let temp = tempfile::tempdir()?;
        std::fs::write(temp.path().join("a.py"), "x\ny\nfoo\nz\n")?;
        std::fs::write(
            temp.path().join("a.py.rej"),
            "@@ -3,1 +3,1 @@\n-foo\n+bar\n",
        )?;
        let root = temp.path().to_string_lossy().into_owned();
        let cli = Cli::try_parse_from(["rejx", "diff", root.as_str()])?;

        let mut out = Vec::new();
        let code = run(cli, &Config::default(), &mut out, Terminal::default())?;
        assert_eq!(code, ExitCode::SUCCESS);
        let text = String::from_utf8(out)?;
        assert!(text.contains("-foo"));
        assert!(text.contains("+bar"));
        Ok(())
    }

    #[test]
    fn fix_without_targets_is_rejected_before_touching_files() {
        let cli = Cli::try_parse_from(["rejx", "fix"]).expect("parses");
        let err = run(cli, &Config::default(), Vec::new(), Terminal::default()).unwrap_err();
        assert!(err.to_string().contains("--all"));
    }
}

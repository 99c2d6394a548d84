use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::Parser;
use rejx::cli::{self, Cli, Terminal};
use rejx::infra::config::Config;
use rejx::infra::logging;

fn main() -> ExitCode {
    let args = Cli::parse();
    rejx::init(logging::level_for(args.verbose, args.quiet));

    let interactive = !args.json && io::stdout().is_terminal();
    let terminal = Terminal {
        color: interactive && std::env::var_os("NO_COLOR").is_none(),
        page: interactive && !args.no_pager,
    };

    let result =
        Config::load().and_then(|config| cli::run(args, &config, io::stdout().lock(), terminal));
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

//! Pipes rendered output through the user's pager.

use std::env;
use std::io::{self, Write};
use std::process::{Command, Stdio};

const DEFAULT_PAGER: &str = "less -R -F";

/// Split a `$PAGER` value into a command line, falling back to `less -R -F`.
pub fn pager_command(value: Option<&str>) -> Vec<String> {
    value
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(DEFAULT_PAGER)
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

/// Show `output` through `$PAGER`.
pub fn page(output: &[u8]) -> io::Result<()> {
    let pager = env::var("PAGER").ok();
    page_with(&pager_command(pager.as_deref()), output)
}

/// Show `output` through `command`, writing to stdout when it cannot start.
pub fn page_with(command: &[String], output: &[u8]) -> io::Result<()> {
    let Some((program, args)) = command.split_first() else {
        return write_stdout(output);
    };
    let mut child = match Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => {
            tracing::debug!(pager = %program, error = %err, "pager unavailable");
            return write_stdout(output);
        }
    };

    if let Some(mut stdin) = child.stdin.take() {
        // Quitting the pager early closes the pipe.
        match stdin.write_all(output) {
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {}
            result => result?,
        }
    }
    child.wait()?;
    Ok(())
}

fn write_stdout(output: &[u8]) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(output)?;
    stdout.flush()
}

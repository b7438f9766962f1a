//! Entry point for the `il2ssd` console client.
//!
//! Delegates to [`il2ssd_cli::run`], which loads configuration, parses the
//! command and talks to the dedicated server console.

use std::io::{self, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    // Diagnostics from the reader thread share stderr, so it is locked per
    // write rather than for the whole run.
    let mut stderr = io::stderr();
    il2ssd_cli::run(std::env::args_os(), io::stdin(), &mut stdout, &mut stderr)
}

//! Entry point for the `userdb` lookup tool.
//!
//! Delegates to [`userdb_cli::run`] with the locked standard streams.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    userdb_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}

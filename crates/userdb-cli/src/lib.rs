//! Command-line front end for the userdb client.
//!
//! [`run`] parses arguments, installs logging, performs one lookup, and
//! prints the result as a JSON line. The exit status tells scripts whether
//! the record was found (0), absent (2), or the service unavailable (3);
//! any failure exits with 1 and a message on stderr.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing::debug;
use userdb_client::{Deadline, MachineIdentity, Resolution, UserDbClient};

mod cli;
mod errors;
mod output;
pub mod telemetry;

use cli::{Cli, Command};
pub use errors::AppError;
use output::{GroupIds, write_json_line};

const RUN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::run");

/// Exit status when the service has no matching record.
pub const EXIT_NOT_FOUND: u8 = 2;

/// Exit status when the userdb service cannot answer.
pub const EXIT_UNAVAILABLE: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Found,
    NotFound,
    Unavailable,
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => return report_usage(&error, stdout, stderr),
    };

    match execute(&cli, stdout) {
        Ok(Outcome::Found) => ExitCode::SUCCESS,
        Ok(Outcome::NotFound) => {
            let _ = writeln!(stderr, "userdb: {} not found", cli.command.subject());
            ExitCode::from(EXIT_NOT_FOUND)
        }
        Ok(Outcome::Unavailable) => {
            let _ = writeln!(
                stderr,
                "userdb: service unavailable at {}",
                cli.config.service_socket()
            );
            ExitCode::from(EXIT_UNAVAILABLE)
        }
        Err(error) => {
            let _ = writeln!(stderr, "userdb: {error}");
            ExitCode::FAILURE
        }
    }
}

fn report_usage<W, E>(error: &clap::Error, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    W: Write,
    E: Write,
{
    let rendered = error.render();
    if error.use_stderr() {
        let _ = write!(stderr, "{rendered}");
        ExitCode::FAILURE
    } else {
        let _ = write!(stdout, "{rendered}");
        ExitCode::SUCCESS
    }
}

fn execute<W: Write>(cli: &Cli, stdout: &mut W) -> Result<Outcome, AppError> {
    let config = &cli.config;
    telemetry::initialise(config)?;

    let machine = MachineIdentity::from_machine_id_file(config.machine_id_path().as_std_path());
    let client = UserDbClient::new(config.service_socket().as_std_path(), machine);
    let deadline = config.timeout().map_or_else(Deadline::none, Deadline::after);
    debug!(
        target: RUN_TARGET,
        command = ?cli.command,
        socket = %config.service_socket(),
        "running lookup"
    );

    match &cli.command {
        Command::User { name } => emit(stdout, client.lookup_user(name, deadline)?),
        Command::Uid { id } => emit(stdout, client.lookup_user_id(id, deadline)?),
        Command::Group { name } => emit(stdout, client.lookup_group(name, deadline)?),
        Command::Gid { id } => emit(stdout, client.lookup_group_id(id, deadline)?),
        Command::Groups { user } => {
            let resolution = client.lookup_group_ids(user, deadline)?.map(|gids| {
                Some(GroupIds {
                    user: user.as_str(),
                    gids,
                })
            });
            emit(stdout, resolution)
        }
    }
}

fn emit<W, T>(stdout: &mut W, resolution: Resolution<Option<T>>) -> Result<Outcome, AppError>
where
    W: Write,
    T: Serialize,
{
    match resolution {
        Resolution::Unavailable => Ok(Outcome::Unavailable),
        Resolution::Resolved(None) => Ok(Outcome::NotFound),
        Resolution::Resolved(Some(record)) => {
            write_json_line(stdout, &record)?;
            Ok(Outcome::Found)
        }
    }
}

#[cfg(test)]
mod tests;

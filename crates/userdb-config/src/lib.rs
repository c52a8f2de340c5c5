//! Runtime configuration for the `userdb` binary.
//!
//! Values are taken from command-line flags first, then `USERDB_*`
//! environment variables, then built-in defaults. A loaded [`Config`] is not
//! modified afterwards.

use std::ffi::OsString;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use thiserror::Error;

mod defaults;
mod logging;
mod socket;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_MACHINE_ID_PATH, DEFAULT_SERVICE_SOCKET, DEFAULT_TIMEOUT_MS,
    default_log_format, timeout_from_millis,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{ServiceSocket, SocketParseError};

/// Settings shared by every `userdb` subcommand.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "userdb")]
pub struct Config {
    /// Socket of the userdb multiplexer, as a path or `unix://` URL.
    #[arg(
        long,
        env = "USERDB_SERVICE_SOCKET",
        value_name = "SOCKET",
        default_value = DEFAULT_SERVICE_SOCKET,
        global = true
    )]
    service_socket: ServiceSocket,
    /// Time budget for one lookup in milliseconds; 0 waits indefinitely.
    #[arg(
        long,
        env = "USERDB_TIMEOUT_MS",
        value_name = "MILLIS",
        default_value_t = DEFAULT_TIMEOUT_MS,
        global = true
    )]
    timeout_ms: u64,
    /// File holding the machine id used to select per-machine overrides.
    #[arg(
        long,
        env = "USERDB_MACHINE_ID_PATH",
        value_name = "PATH",
        default_value = DEFAULT_MACHINE_ID_PATH,
        global = true
    )]
    machine_id_path: Utf8PathBuf,
    /// Tracing filter directive, for example `userdb_client=debug`.
    #[arg(
        long,
        env = "USERDB_LOG_FILTER",
        value_name = "FILTER",
        default_value = DEFAULT_LOG_FILTER,
        global = true
    )]
    log_filter: String,
    /// Log output format: `compact` or `json`.
    #[arg(
        long,
        env = "USERDB_LOG_FORMAT",
        value_name = "FORMAT",
        default_value_t = default_log_format(),
        global = true
    )]
    log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_socket: ServiceSocket::new(DEFAULT_SERVICE_SOCKET),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            machine_id_path: Utf8PathBuf::from(DEFAULT_MACHINE_ID_PATH),
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Parses configuration from an argument list, consulting the
    /// environment for anything the arguments omit.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a flag or variable does not
    /// parse.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(ConfigError::from)
    }

    /// Socket of the userdb multiplexer.
    #[must_use]
    pub const fn service_socket(&self) -> &ServiceSocket {
        &self.service_socket
    }

    /// Time budget for one lookup, or `None` when disabled.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        timeout_from_millis(self.timeout_ms)
    }

    /// File holding the machine id.
    #[must_use]
    pub fn machine_id_path(&self) -> &Utf8Path {
        &self.machine_id_path
    }

    /// Tracing filter directive.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A flag or environment variable held an unusable value.
    #[error(transparent)]
    Invalid(#[from] clap::Error),
}

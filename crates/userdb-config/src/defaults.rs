use std::time::Duration;

use crate::logging::LogFormat;

pub use userdb_client::{DEFAULT_MACHINE_ID_PATH, DEFAULT_SERVICE_SOCKET};

/// Default time budget for one lookup, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Default logging format for the binary.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Converts a millisecond budget into a timeout; zero disables it.
#[must_use]
pub const fn timeout_from_millis(millis: u64) -> Option<Duration> {
    if millis == 0 {
        None
    } else {
        Some(Duration::from_millis(millis))
    }
}

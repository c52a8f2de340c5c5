use std::io;

use thiserror::Error;
use userdb_client::UserDbError;

use crate::telemetry::TelemetryError;

/// Failures that end a `userdb` invocation with exit status 1.
#[derive(Debug, Error)]
pub enum AppError {
    /// Logging could not be set up.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    /// The service was reached but the lookup failed.
    #[error("lookup failed: {0}")]
    Lookup(#[from] UserDbError),
    /// A record could not be rendered as JSON.
    #[error("failed to render output: {0}")]
    Render(#[from] serde_json::Error),
    /// Writing to stdout failed.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

//! Error type shared by every userdb query.

use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::json::JsonError;
use crate::record::DecodeError;
use crate::transport::Phase;

/// Failure of a query that reached, or tried to reach, the service.
///
/// Every variant means the query was handled: the caller should surface it
/// rather than fall back to another identity source.
#[derive(Debug, Clone, Error)]
pub enum UserDbError {
    /// A reply message was not valid JSON.
    #[error("failed to parse userdb reply: {0}")]
    Parse(#[from] JsonError),
    /// A reply was valid JSON but not a usable record.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The socket exists but the connection failed.
    #[error("failed to connect to userdb service at {}: {source}", path.display())]
    Connect {
        /// Socket path.
        path: PathBuf,
        /// Underlying error.
        source: Arc<io::Error>,
    },
    /// Sending the request failed.
    #[error("failed to send request to userdb service: {source}")]
    Write {
        /// Underlying error.
        source: Arc<io::Error>,
    },
    /// Receiving the reply failed.
    #[error("failed to read reply from userdb service: {source}")]
    Read {
        /// Underlying error.
        source: Arc<io::Error>,
    },
    /// The reply grew beyond the accepted size.
    #[error("userdb reply exceeds {limit} bytes")]
    ResponseTooLarge {
        /// Maximum accepted reply size in bytes.
        limit: usize,
    },
    /// The deadline passed before the round trip finished.
    #[error("userdb query timed out while {phase}")]
    Timeout {
        /// Stage of the round trip that was interrupted.
        phase: Phase,
    },
    /// The service answered with an error code this crate does not absorb.
    #[error("userdb service returned error {code}")]
    Protocol {
        /// Qualified error code.
        code: String,
    },
    /// A numeric id argument was not a decimal integer.
    #[error("invalid id {id:?}: {source}")]
    InvalidId {
        /// Argument as given.
        id: String,
        /// Parse failure.
        source: ParseIntError,
    },
}

impl UserDbError {
    /// Whether the query was abandoned because the deadline passed.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub(crate) fn connect(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Connect {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub(crate) fn write(source: io::Error) -> Self {
        Self::Write {
            source: Arc::new(source),
        }
    }

    pub(crate) fn read(source: io::Error) -> Self {
        Self::Read {
            source: Arc::new(source),
        }
    }
}

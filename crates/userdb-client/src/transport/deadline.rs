//! Deadlines threaded through every blocking socket operation.

use std::fmt;
use std::time::{Duration, Instant};

use crate::error::UserDbError;

/// Stage of a round trip, reported when a deadline expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Opening the socket.
    Connect,
    /// Sending the request.
    Write,
    /// Receiving replies.
    Read,
}

impl fmt::Display for Phase {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Connect => "connecting",
            Self::Write => "sending the request",
            Self::Read => "reading the reply",
        })
    }
}

/// Absolute point in time after which a query gives up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// A deadline that never expires.
    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }

    /// Expires `timeout` from now. Timeouts too large to represent never
    /// expire.
    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        Self(Instant::now().checked_add(timeout))
    }

    /// Expires at `instant`.
    #[must_use]
    pub const fn at(instant: Instant) -> Self {
        Self(Some(instant))
    }

    /// The expiry instant, if any.
    #[must_use]
    pub const fn instant(self) -> Option<Instant> {
        self.0
    }

    /// Time left before expiry; `None` when the deadline never expires.
    ///
    /// # Errors
    ///
    /// Returns [`UserDbError::Timeout`] for `phase` once no time is left.
    pub fn remaining(self, phase: Phase) -> Result<Option<Duration>, UserDbError> {
        let Some(instant) = self.0 else {
            return Ok(None);
        };
        match instant.checked_duration_since(Instant::now()) {
            Some(left) if !left.is_zero() => Ok(Some(left)),
            _ => Err(UserDbError::Timeout { phase }),
        }
    }
}

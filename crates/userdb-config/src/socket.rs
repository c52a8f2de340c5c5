use std::fmt;
use std::path::Path;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use percent_encoding::percent_decode_str;
use thiserror::Error;
use url::Url;

const UNIX_SCHEME: &str = "unix";

/// Location of the userdb multiplexer socket.
///
/// Accepts either a plain filesystem path or a `unix://` URL, so the same
/// value can be shared with tools that address sockets by URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSocket {
    path: Utf8PathBuf,
}

impl ServiceSocket {
    /// Builds a socket location from a filesystem path.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Filesystem path of the socket.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Filesystem path of the socket as a standard library path.
    #[must_use]
    pub fn as_std_path(&self) -> &Path {
        self.path.as_std_path()
    }
}

impl fmt::Display for ServiceSocket {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{UNIX_SCHEME}://{}", self.path)
    }
}

impl FromStr for ServiceSocket {
    type Err = SocketParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if !input.contains("://") {
            if input.is_empty() {
                return Err(SocketParseError::MissingPath(input.to_owned()));
            }
            return Ok(Self::new(input));
        }

        let url = Url::parse(input)?;
        if url.scheme() != UNIX_SCHEME {
            return Err(SocketParseError::UnsupportedScheme(url.scheme().to_owned()));
        }
        if let Some(host) = url.host_str()
            && !host.is_empty()
        {
            return Err(SocketParseError::UnexpectedHost {
                input: input.to_owned(),
                host: host.to_owned(),
            });
        }
        let path = percent_decode_str(url.path())
            .decode_utf8()
            .map_err(|_| SocketParseError::InvalidEncoding(input.to_owned()))?;
        if path.is_empty() {
            return Err(SocketParseError::MissingPath(input.to_owned()));
        }
        Ok(Self::new(path.as_ref()))
    }
}

/// Errors encountered while parsing a [`ServiceSocket`] from text.
#[derive(Debug, Error)]
pub enum SocketParseError {
    /// Scheme was not `unix`.
    #[error("unsupported socket scheme '{0}'")]
    UnsupportedScheme(String),
    /// Socket path was absent.
    #[error("missing socket path in '{0}'")]
    MissingPath(String),
    /// A `unix://` URL named a host; the path must follow three slashes.
    #[error("unexpected host '{host}' in '{input}'")]
    UnexpectedHost {
        /// The text being parsed.
        input: String,
        /// The host component found.
        host: String,
    },
    /// The percent-encoded path did not decode to UTF-8.
    #[error("socket path in '{0}' is not valid UTF-8")]
    InvalidEncoding(String),
    /// URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

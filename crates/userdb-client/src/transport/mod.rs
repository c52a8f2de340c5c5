//! Socket round trip for a single userdb call.
//!
//! One call opens one connection: the NUL-terminated request is written, the
//! reply stream is read until the peer closes it or the final message has
//! arrived, and the messages are demultiplexed into the parameter objects
//! handed to a [`FromParameters`] decoder. The connection is dropped on every
//! exit path.

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use socket2::{Domain, SockAddr, Socket, Type};
use tracing::debug;

use crate::error::UserDbError;
use crate::json::Object;
use crate::machine::MachineIdentity;
use crate::protocol::{Call, Reply, ReplyDisposition};
use crate::record::FromParameters;
use crate::resolution::Resolution;

mod deadline;

pub use self::deadline::{Deadline, Phase};

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

/// Connect timeout used when the caller supplies no deadline.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Size of each socket read.
pub const READ_CHUNK: usize = 4096;

/// Largest reply stream accepted for one call.
pub const MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

/// Performs one call against the service listening on `socket`.
///
/// Returns [`Resolution::Unavailable`] when the socket does not exist or the
/// service reports that it cannot answer; the caller may then fall back to
/// another identity source.
///
/// # Errors
///
/// Every other failure is returned as an error: connect, I/O, or timeout
/// problems, malformed replies, and unexpected error codes.
pub fn query<D>(
    socket: &Path,
    call: &Call,
    machine: &MachineIdentity,
    deadline: Deadline,
) -> Result<Resolution<D>, UserDbError>
where
    D: FromParameters,
{
    let request = call.encode();
    let Some(mut stream) = connect(socket, deadline)? else {
        return Ok(Resolution::Unavailable);
    };
    debug!(
        target: TRANSPORT_TARGET,
        socket = %socket.display(),
        method = %call.method(),
        bytes = request.len(),
        "sending userdb request"
    );

    write_request(&mut stream, &request, deadline)?;
    let response = read_response(&mut stream, call.more(), deadline)?;
    let Some(params) = collect_parameters(&response)? else {
        return Ok(Resolution::Unavailable);
    };

    D::from_parameters(params, machine)
        .map(Resolution::Resolved)
        .map_err(UserDbError::from)
}

fn connect(path: &Path, deadline: Deadline) -> Result<Option<UnixStream>, UserDbError> {
    let timeout = deadline
        .remaining(Phase::Connect)?
        .unwrap_or(CONNECT_TIMEOUT);
    match connect_unix(path, timeout) {
        Ok(stream) => Ok(Some(stream)),
        Err(error) => connect_failure(path, error).map_or_else(
            || {
                debug!(
                    target: TRANSPORT_TARGET,
                    socket = %path.display(),
                    "userdb socket absent"
                );
                Ok(None)
            },
            Err,
        ),
    }
}

/// Classifies a failed connect. `None` means the socket does not exist.
///
/// Only `TimedOut` is a timeout here. `WouldBlock` from a Unix socket
/// connect means the listener backlog is full.
pub(crate) fn connect_failure(path: &Path, error: io::Error) -> Option<UserDbError> {
    match error.kind() {
        io::ErrorKind::NotFound => None,
        io::ErrorKind::TimedOut => Some(UserDbError::Timeout {
            phase: Phase::Connect,
        }),
        _ => Some(UserDbError::connect(path, error)),
    }
}

fn connect_unix(path: &Path, timeout: Duration) -> io::Result<UnixStream> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path)?;
    socket.connect_timeout(&address, timeout)?;
    Ok(socket.into())
}

fn is_timeout(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

/// Writes the whole request, re-arming the socket timeout before every
/// attempt from the time left on `deadline`.
pub(crate) fn write_request(
    stream: &mut UnixStream,
    request: &[u8],
    deadline: Deadline,
) -> Result<(), UserDbError> {
    let mut written = 0;
    while let Some(pending) = request.get(written..).filter(|rest| !rest.is_empty()) {
        let timeout = deadline.remaining(Phase::Write)?;
        stream
            .set_write_timeout(timeout)
            .map_err(UserDbError::write)?;
        match stream.write(pending) {
            Ok(0) => return Err(UserDbError::write(io::ErrorKind::WriteZero.into())),
            Ok(count) => written += count,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) if is_timeout(&error) => {
                return Err(UserDbError::Timeout {
                    phase: Phase::Write,
                });
            }
            Err(error) => return Err(UserDbError::write(error)),
        }
    }
    Ok(())
}

/// Reads reply bytes until the peer closes the stream or a chunk ends in NUL.
///
/// For streaming calls a NUL at the end of a chunk only stops reading once
/// some complete message ends the stream.
pub(crate) fn read_response(
    stream: &mut UnixStream,
    more: bool,
    deadline: Deadline,
) -> Result<Vec<u8>, UserDbError> {
    let mut response = Vec::new();
    let mut chunk = [0_u8; READ_CHUNK];
    loop {
        let timeout = deadline.remaining(Phase::Read)?;
        stream
            .set_read_timeout(timeout)
            .map_err(UserDbError::read)?;
        let count = match stream.read(&mut chunk) {
            Ok(count) => count,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) if is_timeout(&error) => {
                return Err(UserDbError::Timeout { phase: Phase::Read });
            }
            Err(error) => return Err(UserDbError::read(error)),
        };

        let Some(received) = chunk.get(..count).filter(|bytes| !bytes.is_empty()) else {
            break;
        };
        if response.len() + received.len() > MAX_RESPONSE_BYTES {
            return Err(UserDbError::ResponseTooLarge {
                limit: MAX_RESPONSE_BYTES,
            });
        }
        response.extend_from_slice(received);

        if received.last() == Some(&0) && (!more || stream_finished(&response)) {
            break;
        }
    }
    Ok(response)
}

/// Whether the complete messages in `response` already end its stream.
///
/// Messages are walked in order. The first accepted message without a
/// continuation ends the stream, as it ends [`collect_parameters`]. A
/// `NoRecordFound` reply without a continuation also ends it. Any other
/// error reply, or a message that does not decode, ends it at once; the
/// error is reported when the messages are collected.
fn stream_finished(response: &[u8]) -> bool {
    let body = response.strip_suffix(b"\0").unwrap_or(response);
    body.split(|byte| *byte == 0)
        .any(|message| match Reply::decode(message) {
            Ok(reply) => match reply.disposition() {
                ReplyDisposition::Accept | ReplyDisposition::Skip => !reply.continues,
                ReplyDisposition::Unavailable | ReplyDisposition::Fail(_) => true,
            },
            Err(_) => true,
        })
}

/// Splits a reply stream into messages and gathers their parameters.
///
/// Returns `None` when a message reports that the service is unavailable.
/// Messages reporting that no record exists are dropped; the first accepted
/// message without a continuation ends the collection, even when more bytes
/// follow.
///
/// # Errors
///
/// Fails on the first message that does not parse or carries any other
/// error code.
pub(crate) fn collect_parameters(response: &[u8]) -> Result<Option<Vec<Object>>, UserDbError> {
    let mut params = Vec::new();
    if response.is_empty() {
        debug!(target: TRANSPORT_TARGET, "empty userdb reply");
        return Ok(Some(params));
    }

    let body = response.strip_suffix(b"\0").unwrap_or(response);
    for (index, message) in body.split(|byte| *byte == 0).enumerate() {
        let reply = Reply::decode(message)?;
        match reply.disposition() {
            ReplyDisposition::Accept => {}
            ReplyDisposition::Skip => {
                debug!(target: TRANSPORT_TARGET, message = index, "no record in reply message");
                continue;
            }
            ReplyDisposition::Unavailable => {
                debug!(target: TRANSPORT_TARGET, message = index, "userdb service not available");
                return Ok(None);
            }
            ReplyDisposition::Fail(code) => {
                debug!(target: TRANSPORT_TARGET, message = index, code, "userdb error reply");
                return Err(UserDbError::Protocol {
                    code: code.to_owned(),
                });
            }
        }

        let continues = reply.continues;
        params.push(reply.parameters);
        if !continues {
            break;
        }
    }

    debug!(target: TRANSPORT_TARGET, messages = params.len(), "collected userdb reply");
    Ok(Some(params))
}

//! Client for the systemd userdb varlink interface.
//!
//! The crate resolves users, groups, and group memberships by talking to the
//! `io.systemd.Multiplexer` service over its Unix socket. It carries its own
//! minimal JSON codec so it does not depend on a general JSON library.
//!
//! Every lookup returns `Result<Resolution<T>, UserDbError>`:
//!
//! - `Ok(Resolution::Unavailable)` means the service cannot answer and the
//!   caller should try another identity source;
//! - `Ok(Resolution::Resolved(_))` is a definitive answer, possibly "not
//!   found";
//! - `Err(_)` means the service was reached and the lookup failed.

mod client;
mod discovery;
mod error;
pub mod json;
mod machine;
pub mod protocol;
pub mod record;
mod resolution;
pub mod transport;

pub use crate::client::UserDbClient;
pub use crate::discovery::probe_service_socket;
pub use crate::error::UserDbError;
pub use crate::machine::{DEFAULT_MACHINE_ID_PATH, MachineIdentity};
pub use crate::protocol::DEFAULT_SERVICE_SOCKET;
pub use crate::record::{Group, User};
pub use crate::resolution::Resolution;
pub use crate::transport::{Deadline, Phase};

//! The five lookup operations exposed to identity resolvers.

use std::collections::BTreeSet;
use std::iter;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::discovery::probe_service_socket;
use crate::error::UserDbError;
use crate::machine::MachineIdentity;
use crate::protocol::{Call, DEFAULT_SERVICE_SOCKET, Method, Selector};
use crate::record::{DecodeError, Group, GroupRecord, Memberships, User, UserRecord};
use crate::resolution::Resolution;
use crate::transport::{self, Deadline};

const CLIENT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::client");

/// Client for the userdb multiplexer.
///
/// Holds only the socket path and the machine identity, both fixed at
/// construction, so one client can serve concurrent callers. Every lookup
/// opens its own connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDbClient {
    socket: PathBuf,
    machine: MachineIdentity,
}

impl UserDbClient {
    /// Builds a client for the service listening on `socket`.
    #[must_use]
    pub fn new(socket: impl Into<PathBuf>, machine: MachineIdentity) -> Self {
        Self {
            socket: socket.into(),
            machine,
        }
    }

    /// Builds a client for the well-known multiplexer socket, or returns
    /// `None` when the socket does not exist.
    #[must_use]
    pub fn discover() -> Option<Self> {
        probe_service_socket(Path::new(DEFAULT_SERVICE_SOCKET))
            .map(|socket| Self::new(socket, MachineIdentity::detect()))
    }

    /// Socket the client connects to.
    #[must_use]
    pub fn socket(&self) -> &Path {
        &self.socket
    }

    /// Identity used to resolve per-machine overrides.
    #[must_use]
    pub const fn machine(&self) -> &MachineIdentity {
        &self.machine
    }

    /// Looks up a group by name.
    ///
    /// # Errors
    ///
    /// Returns [`UserDbError`] when the service was reached but the lookup
    /// failed.
    pub fn lookup_group(
        &self,
        name: &str,
        deadline: Deadline,
    ) -> Result<Resolution<Option<Group>>, UserDbError> {
        self.group(Selector::GroupName(name.to_owned()), deadline)
    }

    /// Looks up a group by its decimal id.
    ///
    /// # Errors
    ///
    /// Returns [`UserDbError::InvalidId`] when `id` is not an integer, and
    /// otherwise fails like [`Self::lookup_group`].
    pub fn lookup_group_id(
        &self,
        id: &str,
        deadline: Deadline,
    ) -> Result<Resolution<Option<Group>>, UserDbError> {
        self.group(Selector::Gid(parse_id(id)?), deadline)
    }

    /// Looks up a user by login name.
    ///
    /// # Errors
    ///
    /// Returns [`UserDbError`] when the service was reached but the lookup
    /// failed.
    pub fn lookup_user(
        &self,
        name: &str,
        deadline: Deadline,
    ) -> Result<Resolution<Option<User>>, UserDbError> {
        self.user(Selector::UserName(name.to_owned()), deadline)
    }

    /// Looks up a user by its decimal id.
    ///
    /// # Errors
    ///
    /// Returns [`UserDbError::InvalidId`] when `id` is not an integer, and
    /// otherwise fails like [`Self::lookup_user`].
    pub fn lookup_user_id(
        &self,
        id: &str,
        deadline: Deadline,
    ) -> Result<Resolution<Option<User>>, UserDbError> {
        self.user(Selector::Uid(parse_id(id)?), deadline)
    }

    /// Collects the ids of every group `user` belongs to, including the
    /// group named after the user.
    ///
    /// Memberships are streamed first, then each group is resolved with its
    /// own round trip. The ids are returned in ascending numeric order
    /// without duplicates.
    ///
    /// # Errors
    ///
    /// Any failed round trip aborts the whole lookup. So does a group,
    /// including the one named after the user, for which the service has no
    /// record: that is reported as [`DecodeError::UnexpectedReply`].
    pub fn lookup_group_ids(
        &self,
        user: &str,
        deadline: Deadline,
    ) -> Result<Resolution<Vec<String>>, UserDbError> {
        let call = Call::streaming(Method::GetMemberships, Selector::UserName(user.to_owned()));
        let Resolution::Resolved(memberships) =
            transport::query::<Memberships>(&self.socket, &call, &self.machine, deadline)?
        else {
            return Ok(Resolution::Unavailable);
        };
        debug!(
            target: CLIENT_TARGET,
            user,
            groups = memberships.len(),
            "resolved memberships"
        );

        let mut gids = BTreeSet::new();
        let primary = iter::once(user);
        let others = memberships.group_names().filter(|group| *group != user);
        for group in primary.chain(others) {
            let group_call = Call::new(Method::GetGroupRecord, Selector::GroupName(group.to_owned()));
            match transport::query::<Option<GroupRecord>>(
                &self.socket,
                &group_call,
                &self.machine,
                deadline,
            )? {
                Resolution::Unavailable => return Ok(Resolution::Unavailable),
                Resolution::Resolved(Some(record)) => {
                    gids.insert(record.gid);
                }
                Resolution::Resolved(None) => {
                    debug!(target: CLIENT_TARGET, group, "group has no record");
                    return Err(DecodeError::UnexpectedReply { count: 0 }.into());
                }
            }
        }

        Ok(Resolution::Resolved(
            gids.into_iter().map(|gid| gid.to_string()).collect(),
        ))
    }

    fn group(
        &self,
        selector: Selector,
        deadline: Deadline,
    ) -> Result<Resolution<Option<Group>>, UserDbError> {
        let call = Call::new(Method::GetGroupRecord, selector);
        let resolution =
            transport::query::<Option<GroupRecord>>(&self.socket, &call, &self.machine, deadline)?;
        Ok(resolution.map(|record| record.map(Group::from)))
    }

    fn user(
        &self,
        selector: Selector,
        deadline: Deadline,
    ) -> Result<Resolution<Option<User>>, UserDbError> {
        let call = Call::new(Method::GetUserRecord, selector);
        let resolution =
            transport::query::<Option<UserRecord>>(&self.socket, &call, &self.machine, deadline)?;
        Ok(resolution.map(|record| record.map(User::from)))
    }
}

fn parse_id(id: &str) -> Result<i64, UserDbError> {
    id.parse().map_err(|source| UserDbError::InvalidId {
        id: id.to_owned(),
        source,
    })
}

//! User record decoding.

use serde::Serialize;

use super::{
    DecodeError, FieldResolver, FromParameters, optional_string, required_str, single_record,
};
use crate::json::Object;
use crate::machine::MachineIdentity;

/// User record after per-machine resolution.
///
/// Fields absent from every layer default to zero or the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// `userName`
    pub user_name: String,
    /// `realName`
    pub real_name: String,
    /// `uid`
    pub uid: i64,
    /// `gid`
    pub gid: i64,
    /// `homeDirectory`
    pub home_directory: String,
    /// `shell`
    pub shell: String,
}

impl UserRecord {
    /// Resolves a user from the `record` object of a reply.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MissingField`] when no layer carries a
    /// `userName` string.
    pub fn from_record(record: &Object, machine: &MachineIdentity) -> Result<Self, DecodeError> {
        let resolver = FieldResolver::new(record, machine);
        Ok(Self {
            user_name: required_str(&resolver, "userName")?.to_owned(),
            real_name: optional_string(&resolver, "realName"),
            uid: resolver.resolve("uid").unwrap_or_default(),
            gid: resolver.resolve("gid").unwrap_or_default(),
            home_directory: optional_string(&resolver, "homeDirectory"),
            shell: optional_string(&resolver, "shell"),
        })
    }
}

impl FromParameters for Option<UserRecord> {
    fn from_parameters(
        params: Vec<Object>,
        machine: &MachineIdentity,
    ) -> Result<Self, DecodeError> {
        single_record(params)?
            .map(|record| UserRecord::from_record(&record, machine))
            .transpose()
    }
}

/// A user as returned to callers, with ids rendered in decimal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Decimal user id.
    pub uid: String,
    /// Decimal primary group id.
    pub gid: String,
    /// Login name.
    pub username: String,
    /// Real name, possibly empty.
    pub name: String,
    /// Home directory, possibly empty.
    pub home_dir: String,
    /// Login shell, possibly empty.
    pub shell: String,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            uid: record.uid.to_string(),
            gid: record.gid.to_string(),
            username: record.user_name,
            name: record.real_name,
            home_dir: record.home_directory,
            shell: record.shell,
        }
    }
}

//! Group record decoding.

use serde::Serialize;

use super::{DecodeError, FieldResolver, FromParameters, required_str, single_record};
use crate::json::Object;
use crate::machine::MachineIdentity;

/// Group record after per-machine resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
    /// `groupName`
    pub group_name: String,
    /// `gid`; zero when no layer defines it.
    pub gid: i64,
}

impl GroupRecord {
    /// Resolves a group from the `record` object of a reply.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MissingField`] when no layer carries a
    /// `groupName` string.
    pub fn from_record(record: &Object, machine: &MachineIdentity) -> Result<Self, DecodeError> {
        let resolver = FieldResolver::new(record, machine);
        Ok(Self {
            group_name: required_str(&resolver, "groupName")?.to_owned(),
            gid: resolver.resolve("gid").unwrap_or_default(),
        })
    }
}

impl FromParameters for Option<GroupRecord> {
    fn from_parameters(
        params: Vec<Object>,
        machine: &MachineIdentity,
    ) -> Result<Self, DecodeError> {
        single_record(params)?
            .map(|record| GroupRecord::from_record(&record, machine))
            .transpose()
    }
}

/// A group as returned to callers, with the id rendered in decimal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    /// Group name.
    pub name: String,
    /// Decimal group id.
    pub gid: String,
}

impl From<GroupRecord> for Group {
    fn from(record: GroupRecord) -> Self {
        Self {
            name: record.group_name,
            gid: record.gid.to_string(),
        }
    }
}

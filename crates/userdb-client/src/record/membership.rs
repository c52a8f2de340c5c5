//! Aggregation of streamed membership pairs.

use std::collections::{BTreeMap, BTreeSet};

use super::{DecodeError, FromParameters, required_member};
use crate::json::Object;
use crate::machine::MachineIdentity;

/// Group names mapped to the user names reported as their members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Memberships {
    groups: BTreeMap<String, BTreeSet<String>>,
}

impl Memberships {
    /// Records that `user` belongs to `group`.
    pub fn insert(&mut self, group: &str, user: &str) {
        self.groups
            .entry(group.to_owned())
            .or_default()
            .insert(user.to_owned());
    }

    /// Distinct group names, in sorted order.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Members recorded for `group`.
    #[must_use]
    pub fn members(&self, group: &str) -> Option<&BTreeSet<String>> {
        self.groups.get(group)
    }

    /// Number of distinct groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no membership was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl FromParameters for Memberships {
    fn from_parameters(
        params: Vec<Object>,
        _machine: &MachineIdentity,
    ) -> Result<Self, DecodeError> {
        let mut memberships = Self::default();
        for pair in &params {
            let user = required_member(pair, "userName")?;
            let group = required_member(pair, "groupName")?;
            memberships.insert(group, user);
        }
        Ok(memberships)
    }
}

//! Per-machine field resolution for user and group records.

use std::iter;

use crate::json::{FromJson, Object, ObjectExt, Value};
use crate::machine::MachineIdentity;

/// Resolves record fields through the base, `perMachine`, and `binding`
/// layers of a record.
///
/// Layers are applied in that order and each defined value overwrites the
/// previous one, so a machine-bound entry beats every per-machine match,
/// which in turn beats the base record. A layer that carries the field with
/// the wrong type is treated as not defining it.
#[derive(Debug, Clone)]
pub struct FieldResolver<'a> {
    base: &'a Object,
    matches: Vec<&'a Object>,
    binding: Option<&'a Object>,
}

impl<'a> FieldResolver<'a> {
    /// Collects the layers of `record` that apply to `machine`.
    #[must_use]
    pub fn new(record: &'a Object, machine: &MachineIdentity) -> Self {
        let matches = record
            .get_as::<&[Value]>("perMachine")
            .unwrap_or_default()
            .iter()
            .filter_map(<&Object>::from_json)
            .filter(|entry| entry_matches(entry, machine))
            .collect();

        let binding = if machine.machine_id().is_empty() {
            None
        } else {
            record
                .get_as::<&Object>("binding")
                .and_then(|binding| binding.get_as::<&Object>(machine.machine_id()))
        };

        Self {
            base: record,
            matches,
            binding,
        }
    }

    /// Effective value of `field`, or `None` when no layer defines it.
    #[must_use]
    pub fn resolve<T>(&self, field: &str) -> Option<T>
    where
        T: FromJson<'a>,
    {
        self.layers()
            .rev()
            .find_map(|layer| layer.get_as::<T>(field))
    }

    /// Number of `perMachine` entries that matched.
    #[must_use]
    pub const fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Whether a `binding` entry exists for the machine.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    fn layers(&self) -> impl DoubleEndedIterator<Item = &'a Object> + '_ {
        iter::once(self.base)
            .chain(self.matches.iter().copied())
            .chain(self.binding)
    }
}

fn entry_matches(entry: &Object, machine: &MachineIdentity) -> bool {
    condition_holds(entry, "matchMachineId", machine.machine_id())
        || condition_holds(entry, "matchHostname", machine.hostname())
}

/// Checks a condition given either as a single string or a string array.
fn condition_holds(entry: &Object, key: &str, wanted: &str) -> bool {
    if wanted.is_empty() {
        return false;
    }
    match entry.get(key) {
        Some(Value::String(single)) => single == wanted,
        Some(Value::Array(candidates)) => candidates
            .iter()
            .any(|candidate| <&str>::from_json(candidate) == Some(wanted)),
        _ => false,
    }
}

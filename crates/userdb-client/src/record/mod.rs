//! Decoders that turn reply parameters into user, group, and membership
//! results.
//!
//! Every decoder implements [`FromParameters`], which the dispatcher calls
//! with the parameter objects it accumulated for one call. Record decoders
//! resolve each field through [`FieldResolver`] so per-machine overrides
//! apply.

use thiserror::Error;

use crate::json::{Object, ObjectExt, Value};
use crate::machine::MachineIdentity;

mod group;
mod membership;
mod resolve;
mod user;

pub use self::group::{Group, GroupRecord};
pub use self::membership::Memberships;
pub use self::resolve::FieldResolver;
pub use self::user::{User, UserRecord};

/// Reply parameters that do not describe a usable result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A mandatory member was absent or had the wrong type.
    #[error("missing or invalid {field} in userdb reply")]
    MissingField {
        /// Name of the member.
        field: &'static str,
    },
    /// A single-record call produced more than one parameter object.
    #[error("unexpected userdb reply: expected one record, got {count}")]
    UnexpectedReply {
        /// Number of parameter objects received.
        count: usize,
    },
}

/// Builds a result from the parameter objects of one call.
///
/// The dispatcher is generic over this capability and never inspects the
/// concrete result kind.
pub trait FromParameters: Sized {
    /// Decodes `params`, resolving per-machine fields against `machine`.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] when the parameters are malformed.
    fn from_parameters(
        params: Vec<Object>,
        machine: &MachineIdentity,
    ) -> Result<Self, DecodeError>;
}

/// Extracts the `record` object from a single-record reply.
///
/// No parameter objects means every provider answered "no record".
fn single_record(params: Vec<Object>) -> Result<Option<Object>, DecodeError> {
    let count = params.len();
    let mut remaining = params.into_iter();
    let Some(mut first) = remaining.next() else {
        return Ok(None);
    };
    if remaining.next().is_some() {
        return Err(DecodeError::UnexpectedReply { count });
    }

    match first.remove("record") {
        Some(Value::Object(record)) => Ok(Some(record)),
        _ => Err(DecodeError::MissingField { field: "record" }),
    }
}

fn required_str<'a>(
    resolver: &FieldResolver<'a>,
    field: &'static str,
) -> Result<&'a str, DecodeError> {
    resolver
        .resolve::<&str>(field)
        .ok_or(DecodeError::MissingField { field })
}

fn optional_string(resolver: &FieldResolver<'_>, field: &str) -> String {
    resolver
        .resolve::<&str>(field)
        .map(String::from)
        .unwrap_or_default()
}

fn required_member<'a>(object: &'a Object, field: &'static str) -> Result<&'a str, DecodeError> {
    object
        .get_as::<&str>(field)
        .ok_or(DecodeError::MissingField { field })
}

//! Minimal JSON codec for userdb varlink messages.
//!
//! The parser understands exactly the shapes the multiplexer emits: objects,
//! arrays, strings, non-negative 64-bit integers, and booleans. There is no
//! representation for `null` or floating point numbers; both fail to parse.
//! Every parse function returns the decoded value together with the bytes it
//! did not consume so callers can continue from the remainder.
//!
//! Outgoing calls are not serialised through a general encoder. The crate
//! writes them by concatenation with [`ObjectWriter`].

use std::collections::HashMap;

mod encode;
mod error;
mod parse;

pub(crate) use self::encode::ObjectWriter;
pub use self::error::JsonError;
pub use self::parse::{
    MAX_DEPTH, MAX_INT_DIGITS, MAX_STRING_CHARS, find_element_start, parse_array, parse_boolean,
    parse_int64, parse_object, parse_string, parse_value,
};

/// JSON object with unique keys and no meaningful iteration order.
pub type Object = HashMap<String, Value>;

/// Decoded JSON value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// `{...}`
    Object(Object),
    /// `[...]`
    Array(Vec<Value>),
    /// `"..."`
    String(String),
    /// Unsigned decimal literal that fits in an `i64`.
    Int(i64),
    /// `true` or `false`.
    Bool(bool),
}

impl Value {
    /// Short name of the variant, used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::String(_) => "string",
            Self::Int(_) => "integer",
            Self::Bool(_) => "boolean",
        }
    }
}

/// Borrowing conversion from a [`Value`] of the matching variant.
///
/// Conversions never coerce: asking for an `i64` from a string yields `None`.
pub trait FromJson<'a>: Sized {
    /// Returns the typed view of `value` when the variant matches.
    fn from_json(value: &'a Value) -> Option<Self>;
}

impl<'a> FromJson<'a> for &'a str {
    fn from_json(value: &'a Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

impl FromJson<'_> for i64 {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Int(number) => Some(*number),
            _ => None,
        }
    }
}

impl FromJson<'_> for bool {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(flag) => Some(*flag),
            _ => None,
        }
    }
}

impl<'a> FromJson<'a> for &'a Object {
    fn from_json(value: &'a Value) -> Option<Self> {
        match value {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl<'a> FromJson<'a> for &'a [Value] {
    fn from_json(value: &'a Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

/// Typed member access for [`Object`].
pub trait ObjectExt {
    /// Returns the member `key` when present and of type `T`.
    fn get_as<'a, T>(&'a self, key: &str) -> Option<T>
    where
        T: FromJson<'a>;
}

impl ObjectExt for Object {
    fn get_as<'a, T>(&'a self, key: &str) -> Option<T>
    where
        T: FromJson<'a>,
    {
        self.get(key).and_then(T::from_json)
    }
}

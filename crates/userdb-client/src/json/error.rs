//! Parse failures raised by the JSON codec.

use thiserror::Error;

/// Errors raised while parsing a JSON fragment.
///
/// A parse error always aborts the enclosing message; partially decoded
/// values are discarded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JsonError {
    /// Input ended before the value was complete.
    #[error("unexpected end of input")]
    UnexpectedEnd,
    /// A structural byte other than the expected one was found.
    #[error("expected {expected}, got {found:?}")]
    UnexpectedByte {
        /// Human-readable description of what the parser wanted.
        expected: &'static str,
        /// The offending byte, rendered as a character.
        found: char,
    },
    /// The separator between an object key and its value was missing.
    #[error("expected colon, got {found:?}")]
    MissingColon {
        /// The byte seen instead of `:`.
        found: char,
    },
    /// A string had no closing quote.
    #[error("unterminated string")]
    UnterminatedString,
    /// A decoded string grew beyond the length cap.
    #[error("string exceeds {limit} characters")]
    StringTooLarge {
        /// Maximum number of characters accepted.
        limit: usize,
    },
    /// A backslash was followed by an unknown escape character.
    #[error("unexpected character in escape sequence {found:?}")]
    InvalidEscape {
        /// Character following the backslash.
        found: char,
    },
    /// A `\u` escape was not followed by four hex digits.
    #[error("invalid unicode escape sequence")]
    InvalidUnicodeEscape,
    /// The digit run was too long to fit into an `i64`.
    #[error("number too large")]
    NumberTooLarge,
    /// No digits were found where an integer was expected.
    #[error("expected integer, got {found:?}")]
    InvalidNumber {
        /// The first byte of the rejected input.
        found: char,
    },
    /// Input was neither `true` nor `false`.
    #[error("unable to parse boolean value")]
    InvalidBoolean,
    /// Containers were nested deeper than the parser allows.
    #[error("nesting exceeds {limit} levels")]
    DepthExceeded {
        /// Maximum accepted nesting depth.
        limit: usize,
    },
}

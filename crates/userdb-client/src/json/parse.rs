//! Byte-level parsers for the JSON subset used by userdb replies.
//!
//! Each parser takes the remaining input, skips leading JSON whitespace, and
//! returns the decoded value with the unconsumed suffix of the input. The
//! returned remainder is always a subslice of the argument.

use super::{JsonError, Object, Value};

/// Longest string, in characters, the parser will decode.
pub const MAX_STRING_CHARS: usize = 4096;

/// Digit runs of this length or longer are rejected. `i64::MAX` has 19 digits.
pub const MAX_INT_DIGITS: usize = 20;

/// Deepest container nesting the parser will follow.
pub const MAX_DEPTH: usize = 64;

const REPLACEMENT: char = char::REPLACEMENT_CHARACTER;

type Parsed<'a, T> = Result<(T, &'a [u8]), JsonError>;

const fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n')
}

fn skip_space(input: &[u8]) -> &[u8] {
    let start = input
        .iter()
        .position(|byte| !is_space(*byte))
        .unwrap_or(input.len());
    input.split_at(start).1
}

/// Returns the input positioned at the value following a key separator.
///
/// Whitespace is skipped on both sides of a single `:`. Any other byte
/// before the colon is an error, as is input without a colon.
///
/// # Errors
///
/// Returns [`JsonError::MissingColon`] when a non-space byte precedes the
/// colon and [`JsonError::UnexpectedEnd`] when no colon is present.
pub fn find_element_start(input: &[u8]) -> Result<&[u8], JsonError> {
    let mut seen_colon = false;
    for (index, byte) in input.iter().copied().enumerate() {
        if is_space(byte) {
            continue;
        }
        if !seen_colon && byte == b':' {
            seen_colon = true;
            continue;
        }
        if seen_colon {
            return Ok(input.split_at(index).1);
        }
        return Err(JsonError::MissingColon {
            found: char::from(byte),
        });
    }

    if seen_colon {
        Ok(input.split_at(input.len()).1)
    } else {
        Err(JsonError::UnexpectedEnd)
    }
}

/// Parses any supported value, dispatching on its first byte.
///
/// `{` starts an object, `[` an array, `"` a string, `t` or `f` a boolean;
/// everything else is handed to the integer parser. `null` therefore fails
/// as an invalid number.
///
/// # Errors
///
/// Propagates the error of whichever value parser was selected.
pub fn parse_value(input: &[u8]) -> Parsed<'_, Value> {
    parse_value_at(input, 0)
}

fn parse_value_at(input: &[u8], depth: usize) -> Parsed<'_, Value> {
    let rest = skip_space(input);
    match rest.first() {
        None => Err(JsonError::UnexpectedEnd),
        Some(b'{') => {
            parse_object_at(rest, depth).map(|(object, tail)| (Value::Object(object), tail))
        }
        Some(b'[') => parse_array_at(rest, depth).map(|(items, tail)| (Value::Array(items), tail)),
        Some(b'"') => parse_string(rest).map(|(text, tail)| (Value::String(text), tail)),
        Some(b't' | b'f') => parse_boolean(rest).map(|(flag, tail)| (Value::Bool(flag), tail)),
        Some(_) => parse_int64(rest).map(|(number, tail)| (Value::Int(number), tail)),
    }
}

/// Parses an object, consuming the closing brace.
///
/// Members may be separated by a comma; the separator is optional, so
/// members abutting one another also parse. A comma directly before the
/// closing brace is rejected.
///
/// # Errors
///
/// Returns an error for a missing opening brace, malformed keys or values,
/// or input that ends before the closing brace.
pub fn parse_object(input: &[u8]) -> Parsed<'_, Object> {
    parse_object_at(input, 0)
}

fn parse_object_at(input: &[u8], depth: usize) -> Parsed<'_, Object> {
    let mut rest = open_container(input, b'{', "'{'", depth)?;
    let mut object = Object::new();
    loop {
        rest = skip_space(rest);
        match rest.split_first() {
            None => return Err(JsonError::UnexpectedEnd),
            Some((b'}', tail)) => return Ok((object, tail)),
            Some(_) => {}
        }

        let (key, after_key) = parse_string(rest)?;
        let value_start = find_element_start(after_key)?;
        let (value, after_value) = parse_value_at(value_start, depth + 1)?;
        object.insert(key, value);
        rest = skip_separator(after_value, b'}')?;
    }
}

/// Parses an array, consuming the closing bracket.
///
/// Elements follow the same separator rules as object members.
///
/// # Errors
///
/// Returns an error for a missing opening bracket, a malformed element, or
/// input that ends before the closing bracket.
pub fn parse_array(input: &[u8]) -> Parsed<'_, Vec<Value>> {
    parse_array_at(input, 0)
}

fn parse_array_at(input: &[u8], depth: usize) -> Parsed<'_, Vec<Value>> {
    let mut rest = open_container(input, b'[', "'['", depth)?;
    let mut items = Vec::new();
    loop {
        rest = skip_space(rest);
        match rest.split_first() {
            None => return Err(JsonError::UnexpectedEnd),
            Some((b']', tail)) => return Ok((items, tail)),
            Some(_) => {}
        }

        let (item, after_item) = parse_value_at(rest, depth + 1)?;
        items.push(item);
        rest = skip_separator(after_item, b']')?;
    }
}

fn open_container<'a>(
    input: &'a [u8],
    open: u8,
    expected: &'static str,
    depth: usize,
) -> Result<&'a [u8], JsonError> {
    if depth >= MAX_DEPTH {
        return Err(JsonError::DepthExceeded { limit: MAX_DEPTH });
    }
    match skip_space(input).split_first() {
        None => Err(JsonError::UnexpectedEnd),
        Some((byte, tail)) if *byte == open => Ok(tail),
        Some((byte, _)) => Err(JsonError::UnexpectedByte {
            expected,
            found: char::from(*byte),
        }),
    }
}

/// Consumes an optional `,` between members, refusing one that directly
/// precedes the closing byte.
fn skip_separator(input: &[u8], close: u8) -> Result<&[u8], JsonError> {
    let rest = skip_space(input);
    let Some(after_comma) = rest.strip_prefix(b",") else {
        return Ok(rest);
    };
    match skip_space(after_comma).first() {
        Some(byte) if *byte == close => Err(JsonError::UnexpectedByte {
            expected: "value after ','",
            found: char::from(close),
        }),
        _ => Ok(after_comma),
    }
}

/// Parses a string literal, decoding escapes.
///
/// Invalid UTF-8 in the raw input decodes to one U+FFFD per offending byte.
/// An unpaired UTF-16 surrogate escape decodes to U+FFFD; when the bytes
/// after a high surrogate are not a low surrogate escape they are left in
/// place and parsed normally.
///
/// # Errors
///
/// Returns an error for a missing opening quote, an unknown or truncated
/// escape, input that ends before the closing quote, or output longer than
/// [`MAX_STRING_CHARS`].
pub fn parse_string(input: &[u8]) -> Parsed<'_, String> {
    let body = match skip_space(input).split_first() {
        None => return Err(JsonError::UnexpectedEnd),
        Some((b'"', tail)) => tail,
        Some((byte, _)) => {
            return Err(JsonError::UnexpectedByte {
                expected: "'\"'",
                found: char::from(*byte),
            });
        }
    };

    let mut value = String::new();
    let mut chars = 0_usize;
    let mut cursor = 0_usize;
    loop {
        let rest = body.get(cursor..).unwrap_or_default();
        let (decoded, width) = match rest.split_first() {
            None => return Err(JsonError::UnterminatedString),
            Some((b'"', tail)) => return Ok((value, tail)),
            Some((b'\\', tail)) => decode_escape(tail)?,
            Some(_) => decode_utf8(rest),
        };

        chars += 1;
        if chars > MAX_STRING_CHARS {
            return Err(JsonError::StringTooLarge {
                limit: MAX_STRING_CHARS,
            });
        }
        value.push(decoded);
        cursor += width;
    }
}

/// Decodes the escape following a backslash.
///
/// Returns the character and the number of input bytes consumed, counting
/// the backslash itself.
fn decode_escape(input: &[u8]) -> Result<(char, usize), JsonError> {
    let Some((code, tail)) = input.split_first() else {
        return Err(JsonError::UnterminatedString);
    };
    let simple = match code {
        b'b' => '\u{8}',
        b'f' => '\u{c}',
        b'n' => '\n',
        b'r' => '\r',
        b't' => '\t',
        b'/' => '/',
        b'\\' => '\\',
        b'"' => '"',
        b'u' => {
            let (decoded, width) = decode_unicode_escape(tail)?;
            return Ok((decoded, width + 2));
        }
        other => {
            return Err(JsonError::InvalidEscape {
                found: char::from(*other),
            });
        }
    };
    Ok((simple, 2))
}

/// Decodes the four hex digits after `\u`, pairing surrogates when possible.
///
/// The returned width excludes the leading `\u`.
fn decode_unicode_escape(input: &[u8]) -> Result<(char, usize), JsonError> {
    let unit = read_hex4(input).ok_or(JsonError::InvalidUnicodeEscape)?;
    if !is_surrogate(unit) {
        return Ok((char::from_u32(unit).unwrap_or(REPLACEMENT), 4));
    }

    // Single-step lookahead for the low half; on any mismatch the cursor
    // stays after the first escape.
    let lookahead = input.get(4..).unwrap_or_default();
    if is_high_surrogate(unit)
        && let Some(hex) = lookahead.strip_prefix(b"\\u")
        && let Some(low) = read_hex4(hex)
        && is_low_surrogate(low)
    {
        let combined = 0x1_0000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
        return Ok((char::from_u32(combined).unwrap_or(REPLACEMENT), 10));
    }

    Ok((REPLACEMENT, 4))
}

fn read_hex4(input: &[u8]) -> Option<u32> {
    input.get(..4)?.iter().try_fold(0_u32, |unit, byte| {
        char::from(*byte)
            .to_digit(16)
            .map(|digit| (unit << 4) | digit)
    })
}

const fn is_surrogate(unit: u32) -> bool {
    matches!(unit, 0xD800..=0xDFFF)
}

const fn is_high_surrogate(unit: u32) -> bool {
    matches!(unit, 0xD800..=0xDBFF)
}

const fn is_low_surrogate(unit: u32) -> bool {
    matches!(unit, 0xDC00..=0xDFFF)
}

/// Decodes one character from raw bytes, yielding U+FFFD for a single
/// invalid byte.
fn decode_utf8(input: &[u8]) -> (char, usize) {
    let width = match input.first() {
        Some(0x00..=0x7F) => 1,
        Some(0xC2..=0xDF) => 2,
        Some(0xE0..=0xEF) => 3,
        Some(0xF0..=0xF4) => 4,
        _ => return (REPLACEMENT, 1),
    };
    input
        .get(..width)
        .and_then(|bytes| std::str::from_utf8(bytes).ok())
        .and_then(|text| text.chars().next())
        .map_or((REPLACEMENT, 1), |decoded| (decoded, width))
}

/// Parses a run of ASCII digits as a non-negative `i64`.
///
/// Signs, fractions, and exponents are not part of the accepted grammar;
/// parsing stops at the first non-digit, which is left in the remainder.
/// Leading zeros are accepted.
///
/// # Errors
///
/// Returns [`JsonError::NumberTooLarge`] for runs of [`MAX_INT_DIGITS`] or
/// more digits, or values above `i64::MAX`, and
/// [`JsonError::InvalidNumber`] when no digit is present.
pub fn parse_int64(input: &[u8]) -> Parsed<'_, i64> {
    let rest = skip_space(input);
    let digits = rest.iter().take_while(|byte| byte.is_ascii_digit()).count();
    if digits >= MAX_INT_DIGITS {
        return Err(JsonError::NumberTooLarge);
    }

    let (number, tail) = rest.split_at(digits);
    if number.is_empty() {
        return match tail.first() {
            None => Err(JsonError::UnexpectedEnd),
            Some(byte) => Err(JsonError::InvalidNumber {
                found: char::from(*byte),
            }),
        };
    }

    let value = number
        .iter()
        .try_fold(0_i64, |total, digit| {
            total
                .checked_mul(10)
                .and_then(|shifted| shifted.checked_add(i64::from(digit - b'0')))
        })
        .ok_or(JsonError::NumberTooLarge)?;
    Ok((value, tail))
}

/// Parses the literal `true` or `false`.
///
/// # Errors
///
/// Returns [`JsonError::InvalidBoolean`] when neither literal is present.
pub fn parse_boolean(input: &[u8]) -> Parsed<'_, bool> {
    let rest = skip_space(input);
    if let Some(tail) = rest.strip_prefix(b"true") {
        return Ok((true, tail));
    }
    if let Some(tail) = rest.strip_prefix(b"false") {
        return Ok((false, tail));
    }
    Err(JsonError::InvalidBoolean)
}

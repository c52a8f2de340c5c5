//! Concatenation-based writer for outgoing JSON objects.

/// Builds a single JSON object member by member.
///
/// Keys are written verbatim and must not need escaping; all keys the
/// crate emits are static identifiers. String values are escaped.
#[derive(Debug)]
pub(crate) struct ObjectWriter {
    buffer: String,
    members: usize,
}

impl ObjectWriter {
    pub(crate) fn new() -> Self {
        Self {
            buffer: String::from("{"),
            members: 0,
        }
    }

    pub(crate) fn string(mut self, key: &str, value: &str) -> Self {
        self.key(key);
        self.buffer.push('"');
        escape_into(&mut self.buffer, value);
        self.buffer.push('"');
        self
    }

    pub(crate) fn int(mut self, key: &str, value: i64) -> Self {
        self.key(key);
        self.buffer.push_str(&value.to_string());
        self
    }

    pub(crate) fn bool(mut self, key: &str, value: bool) -> Self {
        self.key(key);
        self.buffer.push_str(if value { "true" } else { "false" });
        self
    }

    /// Appends an already encoded JSON value.
    pub(crate) fn raw(mut self, key: &str, encoded: &str) -> Self {
        self.key(key);
        self.buffer.push_str(encoded);
        self
    }

    pub(crate) fn finish(mut self) -> String {
        self.buffer.push('}');
        self.buffer
    }

    fn key(&mut self, key: &str) {
        if self.members > 0 {
            self.buffer.push(',');
        }
        self.members += 1;
        self.buffer.push('"');
        self.buffer.push_str(key);
        self.buffer.push_str("\":");
    }
}

fn escape_into(buffer: &mut String, value: &str) {
    for character in value.chars() {
        match character {
            '"' => buffer.push_str("\\\""),
            '\\' => buffer.push_str("\\\\"),
            '\n' => buffer.push_str("\\n"),
            '\r' => buffer.push_str("\\r"),
            '\t' => buffer.push_str("\\t"),
            control if u32::from(control) < 0x20 => {
                buffer.push_str(&format!("\\u{:04x}", u32::from(control)));
            }
            other => buffer.push(other),
        }
    }
}

use std::collections::BTreeMap;
use std::fmt::Write;

/// One field value in a line-protocol record. Integers carry the `i`
/// suffix on the wire; floats are written bare.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
}

impl FieldValue {
    fn is_finite(self) -> bool {
        match self {
            Self::Float(value) => value.is_finite(),
            Self::Integer(_) => true,
        }
    }
}

/// Appends one record: `measurement[,tag=value...] field=value[,...] timestamp`.
///
/// The prefix is written verbatim ahead of the name (no separator is
/// inserted). Records with a non-finite field or no fields at all are
/// skipped entirely.
pub(crate) fn write_record(
    buf: &mut String,
    prefix: &str,
    name: &str,
    tags: &BTreeMap<String, String>,
    fields: &[(&str, FieldValue)],
    timestamp: u64,
) {
    if fields.is_empty() || !fields.iter().all(|(_, value)| value.is_finite()) {
        return;
    }

    escape_measurement(buf, prefix);
    escape_measurement(buf, name);

    for (key, value) in tags {
        buf.push(',');
        escape_tag_key_value(buf, key);
        buf.push('=');
        escape_tag_key_value(buf, value);
    }

    buf.push(' ');
    for (i, (key, value)) in fields.iter().enumerate() {
        if i > 0 {
            buf.push(',');
        }
        escape_tag_key_value(buf, key);
        match value {
            FieldValue::Float(float) => {
                let _ = write!(buf, "={float}");
            }
            FieldValue::Integer(int) => {
                let _ = write!(buf, "={int}i");
            }
        }
    }

    let _ = writeln!(buf, " {timestamp}");
}

fn escape_measurement(buf: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            ',' | ' ' | '\\' => {
                buf.push('\\');
                buf.push(c);
            }
            _ => buf.push(c),
        }
    }
}

fn escape_tag_key_value(buf: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            ',' | '=' | ' ' | '\\' => {
                buf.push('\\');
                buf.push(c);
            }
            _ => buf.push(c),
        }
    }
}

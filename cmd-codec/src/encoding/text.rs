use core::fmt::{self, Write};

use heapless::Vec;

use crate::{error, Value};

/// `fmt::Write` adapter over a field buffer.
struct FieldWriter<'a, const N: usize>(&'a mut Vec<u8, N>);

impl<const N: usize> Write for FieldWriter<'_, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.extend_from_slice(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

/// Append the `Display` form of a value.
pub fn write_display<const N: usize>(
    value: impl fmt::Display,
    dst: &mut Vec<u8, N>,
) -> Result<(), error::EndOfInput> {
    write!(FieldWriter(dst), "{value}").map_err(|_| error::EndOfInput)
}

/// Append the text form the device side can read back with `atoi`/`atof`.
pub fn write_guess<const N: usize>(
    value: &Value<'_>,
    dst: &mut Vec<u8, N>,
) -> Result<(), error::EndOfInput> {
    match *value {
        Value::Float(v) => write!(FieldWriter(dst), "{v:.10e}").map_err(|_| error::EndOfInput),
        Value::Bool(v) => write_display(u8::from(v), dst),
        ref other => write_display(other, dst),
    }
}

/// Decode a string field, stripping NUL padding and surrounding whitespace.
pub fn decode_str(field: &[u8]) -> Result<&str, error::Invalid> {
    core::str::from_utf8(field)
        .map(|s| s.trim_matches('\0').trim())
        .map_err(|_| error::Invalid)
}

/// Best-effort reading of a text field: integer, then float, then string.
///
/// Only fields with a decimal point are read as floats, so `1e5`, `nan` and
/// `inf` stay strings.
pub fn parse_guess(field: &[u8]) -> Result<Value<'_>, error::Invalid> {
    let s = decode_str(field)?;

    if s.contains('.') {
        if let Ok(v) = s.parse::<f64>() {
            return Ok(Value::Float(v));
        }
    } else if let Ok(v) = s.parse::<i64>() {
        return Ok(Value::Int(v));
    }

    Ok(Value::Str(s))
}

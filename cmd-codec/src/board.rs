//! Board data widths.
//!
//! The host has to know how wide the device's C `int`, `long`, `float` and
//! `double` are to lay out binary arguments, and which values fit.

use heapless::Vec;

use crate::{
    encoding::text,
    error::{self, Error},
    format::Format,
    BinArg, Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Board {
    int_bytes: usize,
    long_bytes: usize,
    float_bytes: usize,
    double_bytes: usize,
}

/// How faithfully a value was encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Encoded {
    Exact,
    /// The value had to be converted (e.g. a float truncated to an int).
    Coerced,
    /// The value was sent as text for the device to interpret.
    Guessed,
}

impl Default for Board {
    fn default() -> Self {
        Self::ATMEGA
    }
}

impl Board {
    /// ATmega boards (Uno, Nano, Mega): 16-bit int, `double` is a `float`.
    pub const ATMEGA: Self = Self {
        int_bytes: 2,
        long_bytes: 4,
        float_bytes: 4,
        double_bytes: 4,
    };

    /// 32-bit ARM boards (Due, Zero): 32-bit int, 64-bit double.
    pub const ARM32: Self = Self {
        int_bytes: 4,
        long_bytes: 4,
        float_bytes: 4,
        double_bytes: 8,
    };

    pub const fn new(
        int_bytes: usize,
        long_bytes: usize,
        float_bytes: usize,
        double_bytes: usize,
    ) -> Result<Self, Error> {
        let valid = matches!(int_bytes, 2 | 4 | 8)
            && matches!(long_bytes, 4 | 8)
            && matches!(float_bytes, 4 | 8)
            && matches!(double_bytes, 4 | 8);

        if !valid {
            return Err(Error::BadSpec);
        }

        Ok(Self {
            int_bytes,
            long_bytes,
            float_bytes,
            double_bytes,
        })
    }

    pub const fn int_bytes(&self) -> usize {
        self.int_bytes
    }

    pub const fn long_bytes(&self) -> usize {
        self.long_bytes
    }

    pub const fn float_bytes(&self) -> usize {
        self.float_bytes
    }

    pub const fn double_bytes(&self) -> usize {
        self.double_bytes
    }

    /// Binary width of a format on this board, `None` for text formats.
    pub const fn width(&self, format: Format) -> Option<usize> {
        match format {
            Format::Char | Format::Byte | Format::Bool => Some(1),
            Format::Int | Format::UnsignedInt => Some(self.int_bytes),
            Format::Long | Format::UnsignedLong => Some(self.long_bytes),
            Format::Float => Some(self.float_bytes),
            Format::Double => Some(self.double_bytes),
            Format::String | Format::Guess => None,
        }
    }

    /// Append the field bytes of `value` in the given format.
    pub fn encode<const N: usize>(
        &self,
        format: Format,
        value: &Value<'_>,
        dst: &mut Vec<u8, N>,
    ) -> Result<Encoded, Error> {
        match format {
            Format::Char => {
                let c = value.as_char().filter(char::is_ascii).ok_or(Error::Invalid)?;
                push(dst, &[c as u8])?;

                Ok(Encoded::Exact)
            }
            Format::Byte => encode_integer(value, 1, false, dst),
            Format::Int => encode_integer(value, self.int_bytes, true, dst),
            Format::UnsignedInt => encode_integer(value, self.int_bytes, false, dst),
            Format::Long => encode_integer(value, self.long_bytes, true, dst),
            Format::UnsignedLong => encode_integer(value, self.long_bytes, false, dst),
            Format::Float => encode_float(value, self.float_bytes, dst),
            Format::Double => encode_float(value, self.double_bytes, dst),
            Format::String => {
                text::write_display(value, dst)?;

                Ok(Encoded::Exact)
            }
            Format::Bool => {
                let flag = match *value {
                    Value::Bool(flag) => flag,
                    ref other => match other.as_integer() {
                        Some(0) => false,
                        Some(1) => true,
                        _ => Err(Error::Invalid)?,
                    },
                };
                push(dst, &[u8::from(flag)])?;

                Ok(Encoded::Exact)
            }
            Format::Guess => {
                text::write_guess(value, dst)?;

                Ok(Encoded::Guessed)
            }
        }
    }

    /// Read a value of the given format out of an unescaped field.
    pub fn decode<'a>(&self, format: Format, field: &'a [u8]) -> Result<Value<'a>, Error> {
        Ok(match format {
            Format::Char => Value::Char(char::from(single(field)?)),
            Format::Byte => Value::Byte(single(field)?),
            Format::Bool => Value::Bool(single(field)? != 0),
            Format::Int => Value::Int(decode_signed(field, self.int_bytes)?),
            Format::UnsignedInt => Value::UInt(decode_unsigned(field, self.int_bytes)?),
            Format::Long => Value::Int(decode_signed(field, self.long_bytes)?),
            Format::UnsignedLong => Value::UInt(decode_unsigned(field, self.long_bytes)?),
            Format::Float => Value::Float(decode_float(field, self.float_bytes)?),
            Format::Double => Value::Float(decode_float(field, self.double_bytes)?),
            Format::String => Value::Str(text::decode_str(field)?),
            Format::Guess => text::parse_guess(field)?,
        })
    }
}

fn push<const N: usize>(dst: &mut Vec<u8, N>, bytes: &[u8]) -> Result<(), error::EndOfInput> {
    dst.extend_from_slice(bytes).map_err(|_| error::EndOfInput)
}

fn expect_width(field: &[u8], width: usize) -> Result<(), Error> {
    if field.len() != width {
        Err(Error::Length {
            expected: width,
            found: field.len(),
        })?
    }

    Ok(())
}

fn single(field: &[u8]) -> Result<u8, Error> {
    match *field {
        [byte] => Ok(byte),
        _ => Err(Error::Length {
            expected: 1,
            found: field.len(),
        }),
    }
}

fn encode_integer<const N: usize>(
    value: &Value<'_>,
    width: usize,
    signed: bool,
    dst: &mut Vec<u8, N>,
) -> Result<Encoded, Error> {
    let (v, encoded) = match (value.as_integer(), *value) {
        (Some(v), _) => (v, Encoded::Exact),
        (None, Value::Float(f)) if f.is_finite() => (f as i128, Encoded::Coerced),
        (None, Value::Str(s)) => (
            s.trim().parse::<i128>().map_err(|_| Error::Invalid)?,
            Encoded::Coerced,
        ),
        _ => Err(Error::Invalid)?,
    };

    let bits = 8 * width as u32;
    let (min, max) = if signed {
        (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
    } else {
        (0, (1i128 << bits) - 1)
    };

    if v < min || v > max {
        Err(Error::Overflow)?
    }

    // two's complement truncation is correct for both signednesses in range
    push(dst, &v.to_le_bytes()[..width])?;

    Ok(encoded)
}

fn encode_float<const N: usize>(
    value: &Value<'_>,
    width: usize,
    dst: &mut Vec<u8, N>,
) -> Result<Encoded, Error> {
    let v = value.as_float().ok_or(Error::Invalid)?;

    if width == 4 {
        if v.abs() > f64::from(f32::MAX) {
            Err(Error::Overflow)?
        }

        push(dst, &(v as f32).to_le_bytes())?;
    } else {
        push(dst, &v.to_le_bytes())?;
    }

    Ok(Encoded::Exact)
}

fn decode_signed(field: &[u8], width: usize) -> Result<i64, Error> {
    expect_width(field, width)?;

    Ok(match width {
        1 => i8::decode_bin(field)?.into(),
        2 => i16::decode_bin(field)?.into(),
        4 => i32::decode_bin(field)?.into(),
        _ => i64::decode_bin(field)?,
    })
}

fn decode_unsigned(field: &[u8], width: usize) -> Result<u64, Error> {
    expect_width(field, width)?;

    Ok(match width {
        1 => u8::decode_bin(field)?.into(),
        2 => u16::decode_bin(field)?.into(),
        4 => u32::decode_bin(field)?.into(),
        _ => u64::decode_bin(field)?,
    })
}

fn decode_float(field: &[u8], width: usize) -> Result<f64, Error> {
    expect_width(field, width)?;

    Ok(match width {
        4 => f32::decode_bin(field)?.into(),
        _ => f64::decode_bin(field)?,
    })
}

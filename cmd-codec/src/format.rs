//! Argument format strings.
//!
//! A format string holds one character per argument. A trailing `*` repeats
//! the format before it for every remaining argument, so `"l*"` describes any
//! number of longs.

use heapless::Vec;

use crate::MAX_ARGS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Not a known format character.
    Unknown(char),
    /// `*` must occur once, last, and after at least one other format.
    MisplacedStar,
    /// More than `MAX_ARGS` formats.
    TooMany,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Format {
    Char,
    Byte,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    Float,
    Double,
    String,
    Bool,
    Guess,
}

impl Format {
    pub const fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'c' => Self::Char,
            'b' => Self::Byte,
            'i' => Self::Int,
            'I' => Self::UnsignedInt,
            'l' => Self::Long,
            'L' => Self::UnsignedLong,
            'f' => Self::Float,
            'd' => Self::Double,
            's' => Self::String,
            '?' => Self::Bool,
            'g' => Self::Guess,
            _ => return None,
        })
    }

    pub const fn as_char(self) -> char {
        match self {
            Self::Char => 'c',
            Self::Byte => 'b',
            Self::Int => 'i',
            Self::UnsignedInt => 'I',
            Self::Long => 'l',
            Self::UnsignedLong => 'L',
            Self::Float => 'f',
            Self::Double => 'd',
            Self::String => 's',
            Self::Bool => '?',
            Self::Guess => 'g',
        }
    }

    /// Whether the argument travels as raw bytes.
    pub const fn is_binary(self) -> bool {
        !matches!(self, Self::String | Self::Guess)
    }
}

pub type Formats = Vec<Format, MAX_ARGS>;

/// Parse a format string for `arg_count` arguments, expanding `*`.
///
/// The result may still differ in length from `arg_count`; whether that is
/// an error is up to the caller.
pub fn expand(spec: &str, arg_count: usize) -> Result<Formats, Error> {
    let stars = spec.chars().filter(|&c| c == '*').count();
    let body = match stars {
        0 => spec,
        1 => spec
            .strip_suffix('*')
            .filter(|body| !body.is_empty())
            .ok_or(Error::MisplacedStar)?,
        _ => Err(Error::MisplacedStar)?,
    };

    let mut formats = Formats::new();

    for c in body.chars() {
        let format = Format::from_char(c).ok_or(Error::Unknown(c))?;
        formats.push(format).map_err(|_| Error::TooMany)?;
    }

    if stars == 1 {
        // body is non-empty, so there is a last format to repeat
        if let Some(&last) = formats.last() {
            while formats.len() < arg_count {
                formats.push(last).map_err(|_| Error::TooMany)?;
            }
        }
    }

    Ok(formats)
}

/// A format list of `count` guesses, for commands without a known format.
pub fn guesses(count: usize) -> Result<Formats, Error> {
    let mut formats = Formats::new();

    for _ in 0..count {
        formats.push(Format::Guess).map_err(|_| Error::TooMany)?;
    }

    Ok(formats)
}

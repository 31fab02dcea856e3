//! Typed arguments for the CmdMessenger wire format.
//!
//! Arguments travel either as raw little-endian bytes ("binary" arguments,
//! read on the device with `readBinArg`) or as ASCII text. This crate knows
//! how to turn values into field bytes and back; framing and escaping are the
//! messenger's job.

#![no_std]

pub mod board;
pub mod encoding;
pub mod format;
pub mod value;

pub use board::{Board, Encoded};
pub use format::{Format, Formats};
pub use value::Value;

/// Maximum number of arguments a single command may carry.
pub const MAX_ARGS: usize = 32;

pub mod error {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct EndOfInput;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Invalid;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum Error {
        /// Ran out of source bytes or destination space.
        EndOfInput,
        /// The value cannot be represented in the requested format.
        Invalid,
        /// The value exceeds the range of the board's data type.
        Overflow,
        /// A binary field had the wrong width.
        Length { expected: usize, found: usize },
        /// Unsupported board data widths.
        BadSpec,
    }

    impl From<EndOfInput> for Error {
        fn from(_: EndOfInput) -> Self {
            Self::EndOfInput
        }
    }

    impl From<Invalid> for Error {
        fn from(_: Invalid) -> Self {
            Self::Invalid
        }
    }
}

/// Types that can be sent and received as binary arguments.
///
/// The byte layout is the in-memory layout of the matching C type on a
/// little-endian microcontroller, which is what `sendCmdBinArg` and
/// `readBinArg` copy verbatim.
pub trait BinArg: Sized {
    /// Width of the encoded value in bytes.
    const SIZE: usize;

    /// Encode into a destination via an iterator.
    fn encode_bin<'a>(
        &self,
        dst: impl IntoIterator<Item = &'a mut u8>,
    ) -> Result<(), error::EndOfInput>;

    /// Decode from a source via an iterator.
    fn decode_bin<'a>(src: impl IntoIterator<Item = &'a u8>) -> Result<Self, error::Error>;

    /// Decode from a complete field, which must be exactly `SIZE` bytes wide.
    fn from_field(field: &[u8]) -> Result<Self, error::Error> {
        if field.len() != Self::SIZE {
            Err(error::Error::Length {
                expected: Self::SIZE,
                found: field.len(),
            })?
        }

        Self::decode_bin(field)
    }
}

/// Largest `BinArg::SIZE` of the provided implementations.
pub const MAX_BIN_SIZE: usize = 8;

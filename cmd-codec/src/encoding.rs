//! Field encodings.
//!
//! `binary` holds the fixed-width little-endian implementations of
//! [`BinArg`](crate::BinArg), `text` the ASCII forms used by string and
//! "guess" arguments.

pub mod binary;
pub mod text;

//! Async CmdMessenger links over `embedded-io-async` ports.
//!
//! [`Messenger`] is the device end: it dispatches incoming commands to
//! [`Callback`]s and sends replies. [`Host`](host::Host) is the computer
//! end: it sends and receives commands by name with argument formats
//! laid out for a given [`Board`].

#![no_std]

extern crate self as cmd_messenger;

#[macro_use]
mod fmt;

mod callback;
mod command;
mod error;
pub mod framing;
pub mod host;
mod messenger;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod rx_buffer;

pub use callback::{callbacks, Callback, CallbackTable};
pub use cmd_codec::{self as codec, BinArg, Board, Encoded, Format, Value};
pub use command::{CommandSet, CommandSpec, CommandTable, Commands};
pub use embedded_io_async;
pub use error::Error;
pub use framing::Separators;
pub use messenger::Messenger;

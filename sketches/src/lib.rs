//! The CmdMessenger link test sketches, as callbacks.
//!
//! Every sketch answers a ping command with a pong built from the ping's
//! arguments. Arguments are binary: `f64` doubles and `i32` longs, which is
//! what a host configured with [`Board::ARM32`](cmd_messenger::Board::ARM32)
//! sends and expects.

#![no_std]

pub mod duplex;
pub mod rapid_float;
pub mod star_format;

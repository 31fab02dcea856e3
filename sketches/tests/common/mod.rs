#![allow(dead_code)]

use cmd_messenger::{
    host::{Host, HostConfig},
    mock::{MockDelay, MockError, MockPort},
    Board, CommandSet, CommandTable, Messenger, Separators,
};

pub const CAPACITY: usize = 256;

pub type Port = MockPort<CAPACITY>;
pub type TestHost = Host<'static, Port, MockDelay, CAPACITY>;
pub type Device = Messenger<Port, CAPACITY>;

/// A host set up the way the sketches expect: 4-byte longs, 8-byte doubles.
pub fn host<C: CommandSet>() -> TestHost {
    let table = CommandTable::of::<C, MockError>().unwrap();
    let config = HostConfig {
        board: Board::ARM32,
        ..Default::default()
    };

    Host::new(Port::new(), MockDelay::new(), table, config)
}

pub fn device() -> Device {
    Messenger::new(Port::new(), Separators::default())
}

/// Move everything written to `from` into the receive side of `to`.
pub fn relay(from: &mut Port, to: &mut Port) {
    let bytes = from.take_written();
    to.feed(&bytes).unwrap();
}

/// Deterministic xorshift source standing in for a hardware RNG.
pub struct XorShift(pub u32);

impl rand_core::RngCore for XorShift {
    fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    fn next_u64(&mut self) -> u64 {
        rand_core::impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        rand_core::impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

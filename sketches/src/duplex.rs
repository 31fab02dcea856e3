//! Echo three doubles, sending each one back before reading the next.
//!
//! The reply is started before the ping is fully read, so this exercises
//! reading and writing a link at the same time.

use core::convert::Infallible;

use cmd_messenger::{Callback, CallbackTable, Commands, Error, Messenger, Separators};
use embedded_io_async::{Read, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Commands)]
pub enum Command {
    #[format("ddd")]
    DoublePing,
    #[format("ddd")]
    DoublePong,
}

pub struct OnDoublePing;

impl<Port: Read + Write, const N: usize> Callback<Port, N> for OnDoublePing {
    async fn call(&mut self, messenger: &mut Messenger<Port, N>) -> Result<(), Error<Port::Error>> {
        messenger.send_cmd_start(Command::DoublePong).await?;

        for _ in 0..3 {
            let value: f64 = messenger.read_bin_arg()?;
            messenger.send_cmd_bin_arg(&value).await?;
        }

        messenger.send_cmd_end().await
    }
}

pub fn callbacks<E>() -> Result<CallbackTable<OnDoublePing, 1>, Error<E>> {
    let mut callbacks = CallbackTable::new();
    callbacks.attach::<E>(Command::DoublePing, OnDoublePing)?;

    Ok(callbacks)
}

pub async fn serve<Port: Read + Write, const N: usize>(port: Port) -> Result<Infallible, Error<Port::Error>> {
    let mut callbacks = callbacks::<Port::Error>()?;
    let mut messenger = Messenger::<_, N>::new(port, Separators::default());

    messenger.run(&mut callbacks).await
}

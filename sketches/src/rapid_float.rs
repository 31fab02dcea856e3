//! Echo a single double as fast as the link allows.

use core::convert::Infallible;

use cmd_messenger::{Callback, CallbackTable, Commands, Error, Messenger, Separators};
use embedded_io_async::{Read, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Commands)]
pub enum Command {
    #[format("d")]
    DoublePing,
    #[format("d")]
    DoublePong,
}

pub struct OnDoublePing;

impl<Port: Read + Write, const N: usize> Callback<Port, N> for OnDoublePing {
    async fn call(&mut self, messenger: &mut Messenger<Port, N>) -> Result<(), Error<Port::Error>> {
        let value: f64 = messenger.read_bin_arg()?;

        messenger.send_bin_cmd(Command::DoublePong, &value).await
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

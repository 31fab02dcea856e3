//! Variable-length integer series, as used with the `l*` format.
//!
//! Two handlers answer `multi_ping`:
//! - [`OnMultiPingEcho`] reads a count followed by that many longs and
//!   echoes the longs, pausing after each one.
//! - [`OnMultiPingCountdown`] ignores its arguments and replies with a
//!   random-length run of longs counting down by one.
//!
//! [`MultiPing`] holds either, so the choice can be made at startup.

use core::convert::Infallible;

use cmd_messenger::{callbacks, Callback, CallbackTable, Commands, Error, Messenger, Separators};
use embedded_hal_async::delay::DelayNs;
use embedded_io_async::{Read, Write};
use rand_core::RngCore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Commands)]
pub enum Command {
    #[format("l*")]
    MultiPing,
    #[format("l*")]
    MultiPong,
}

/// Pause after each echoed value.
pub const ECHO_DELAY_MS: u32 = 50;

/// Longest countdown.
pub const MAX_COUNTDOWN: u32 = 14;

/// Countdowns start at most this far above their length.
const COUNTDOWN_SPREAD: u32 = 1000;

pub struct OnMultiPingEcho<D> {
    delay: D,
}

impl<D> OnMultiPingEcho<D> {
    pub const fn new(delay: D) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }
}

impl<Port, const N: usize, D> Callback<Port, N> for OnMultiPingEcho<D>
where
    Port: Read + Write,
    D: DelayNs,
{
    async fn call(&mut self, messenger: &mut Messenger<Port, N>) -> Result<(), Error<Port::Error>> {
        let count: i32 = messenger.read_bin_arg()?;

        // never promise more values than arrived
        let count = usize::try_from(count)
            .unwrap_or(0)
            .min(messenger.remaining_args());

        messenger.send_cmd_start(Command::MultiPong).await?;

        for _ in 0..count {
            let value: i32 = messenger.read_bin_arg()?;
            messenger.send_cmd_bin_arg(&value).await?;

            self.delay.delay_ms(ECHO_DELAY_MS).await;
        }

        messenger.send_cmd_end().await
    }
}

pub struct OnMultiPingCountdown<R> {
    rng: R,
}

impl<R> OnMultiPingCountdown<R> {
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<Port, const N: usize, R> Callback<Port, N> for OnMultiPingCountdown<R>
where
    Port: Read + Write,
    R: RngCore,
{
    async fn call(&mut self, messenger: &mut Messenger<Port, N>) -> Result<(), Error<Port::Error>> {
        let length = 1 + self.rng.next_u32() % MAX_COUNTDOWN;
        let start = length + self.rng.next_u32() % COUNTDOWN_SPREAD;

        messenger.send_cmd_start(Command::MultiPong).await?;

        for value in (start - length + 1..=start).rev() {
            // bounded by MAX_COUNTDOWN + COUNTDOWN_SPREAD
            messenger.send_cmd_bin_arg(&(value as i32)).await?;
        }

        messenger.send_cmd_end().await
    }
}

#[callbacks]
pub enum MultiPing<D, R> {
    Echo(OnMultiPingEcho<D>),
    Countdown(OnMultiPingCountdown<R>),
}

pub fn callbacks<H, E>(handler: H) -> Result<CallbackTable<H, 1>, Error<E>> {
    let mut callbacks = CallbackTable::new();
    callbacks.attach::<E>(Command::MultiPing, handler)?;

    Ok(callbacks)
}

/// Serve `multi_ping` with `handler`, which is one of the handlers above or
/// a [`MultiPing`] holding one.
pub async fn serve<Port, H, const N: usize>(port: Port, handler: H) -> Result<Infallible, Error<Port::Error>>
where
    Port: Read + Write,
    H: Callback<Port, N>,
{
    let mut callbacks = callbacks::<H, Port::Error>(handler)?;
    let mut messenger = Messenger::<_, N>::new(port, Separators::default());

    messenger.run(&mut callbacks).await
}

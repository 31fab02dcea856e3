use core::{convert::Infallible, fmt::Display, str::FromStr};

use cmd_codec::{
    encoding::text,
    error::{EndOfInput, Invalid},
    BinArg, MAX_BIN_SIZE,
};
use embedded_io_async::{Read, Write};
use heapless::Vec;

use crate::{
    framing::{Frame, Inbox, Separators, Step},
    Callback, CallbackTable, Error,
};

/// The device side of a CmdMessenger link.
///
/// Buffers up to `N` bytes of received data and of a single command.
pub struct Messenger<Port, const N: usize> {
    port: Port,
    separators: Separators,
    inbox: Inbox<N>,
    frame: Frame<N>,
    cursor: usize,
    print_lf_cr: bool,
    sending: bool,
}

impl<Port, const N: usize> Messenger<Port, N>
where
    Port: Read + Write,
{
    pub const fn new(port: Port, separators: Separators) -> Self {
        Self {
            port,
            separators,
            inbox: Inbox::new(separators),
            frame: Frame::new(),
            cursor: 0,
            print_lf_cr: false,
            sending: false,
        }
    }

    /// Terminate every sent command with `\r\n` as well.
    pub fn print_lf_cr(&mut self, enable: bool) {
        self.print_lf_cr = enable;
    }

    pub fn separators(&self) -> &Separators {
        &self.separators
    }

    pub fn port(&self) -> &Port {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut Port {
        &mut self.port
    }

    pub fn into_port(self) -> Port {
        self.port
    }

    // ---- receiving ----

    /// Read once from the port and invoke the handler of every command that
    /// completed.
    ///
    /// Commands left buffered by [`next_command`](Self::next_command) are
    /// handled first, without waiting on the port.
    pub async fn feed_in_serial_data<H, const K: usize>(
        &mut self,
        callbacks: &mut CallbackTable<H, K>,
    ) -> Result<(), Error<Port::Error>>
    where
        H: Callback<Port, N>,
    {
        if self.dispatch_buffered(callbacks).await? == 0 {
            self.fill().await?;
            self.dispatch_buffered(callbacks).await?;
        }

        Ok(())
    }

    /// Handle commands forever.
    ///
    /// Only port errors end the loop; anything else is logged and the
    /// offending command dropped.
    pub async fn run<H, const K: usize>(
        &mut self,
        callbacks: &mut CallbackTable<H, K>,
    ) -> Result<Infallible, Error<Port::Error>>
    where
        H: Callback<Port, N>,
    {
        loop {
            self.feed_in_serial_data(callbacks).await?;
        }
    }

    /// Wait for the next complete command without dispatching it.
    ///
    /// Returns its id, or `None` if the id field is not a number. The
    /// arguments are then available through the `read_*` methods.
    pub async fn next_command(&mut self) -> Result<Option<u16>, Error<Port::Error>> {
        loop {
            if self.next_frame()? {
                return Ok(self.command_id());
            }

            self.fill().await?;
        }
    }

    /// Id of the current command.
    pub fn command_id(&self) -> Option<u16> {
        self.frame.command_id()
    }

    /// Arguments of the current command not yet read.
    pub fn remaining_args(&self) -> usize {
        self.frame.len().saturating_sub(self.cursor)
    }

    /// Read the next argument as a binary value.
    pub fn read_bin_arg<T: BinArg>(&mut self) -> Result<T, Error<Port::Error>> {
        Ok(T::from_field(self.next_field()?)?)
    }

    /// Read the next argument as text and parse it.
    pub fn read_arg<T: FromStr>(&mut self) -> Result<T, Error<Port::Error>> {
        let arg = text::decode_str(self.next_field()?)?;

        Ok(arg.parse().map_err(|_| Invalid)?)
    }

    /// Read the next argument as a string, NUL padding removed.
    pub fn read_str_arg(&mut self) -> Result<&str, Error<Port::Error>> {
        let field = self.next_field()?;
        let arg = core::str::from_utf8(field).map_err(|_| Invalid)?;

        Ok(arg.trim_end_matches('\0'))
    }

    fn next_field(&mut self) -> Result<&[u8], Error<Port::Error>> {
        let field = self.frame.field(self.cursor).ok_or(Error::MissingArg)?;
        self.cursor += 1;

        Ok(field)
    }

    /// Receive into the free part of the inbox.
    async fn fill(&mut self) -> Result<usize, Error<Port::Error>> {
        let region = self.inbox.writable();

        if region.is_empty() {
            Err(Error::Overflow)?;
        }

        let count = self.port.read(region).await.map_err(Error::Io)?;
        self.inbox.commit(count);

        trace!("received {} bytes", count);

        Ok(count)
    }

    /// Deframe buffered bytes until a command completes.
    ///
    /// Bytes after the completed command stay buffered.
    fn next_frame(&mut self) -> Result<bool, Error<Port::Error>> {
        match self.inbox.poll() {
            Step::Incomplete => Ok(false),
            Step::Complete => {
                self.frame = self.inbox.take();
                self.cursor = 1;

                Ok(true)
            }
            Step::Discarded => {
                warn!("dropped a command larger than {} bytes", N);

                Err(Error::Overflow)
            }
        }
    }

    async fn dispatch_buffered<H, const K: usize>(
        &mut self,
        callbacks: &mut CallbackTable<H, K>,
    ) -> Result<usize, Error<Port::Error>>
    where
        H: Callback<Port, N>,
    {
        let mut handled = 0;

        loop {
            match self.next_frame() {
                Ok(true) => {}
                Ok(false) => return Ok(handled),
                Err(Error::Overflow) => continue,
                Err(e) => return Err(e),
            }

            handled += 1;

            let id = self.command_id();

            let Some(handler) = callbacks.lookup(id) else {
                warn!("no handler for command {}", id);
                continue;
            };

            debug!("dispatching command {}", id);

            match handler.call(self).await {
                Ok(()) => {}
                Err(e) if e.is_io() => return Err(e),
                Err(_) => {
                    warn!("handler for command {} failed", id);

                    // close a reply the handler left open
                    if self.sending {
                        self.send_cmd_end().await?;
                    }
                }
            }
        }
    }

    // ---- sending ----

    /// Begin a command. Arguments follow through the `send_cmd_*arg` methods.
    ///
    /// A command still open from an earlier start is terminated first.
    pub async fn send_cmd_start(&mut self, id: impl Into<u16>) -> Result<(), Error<Port::Error>> {
        if self.sending {
            warn!("terminating unfinished command");
            self.send_cmd_end().await?;
        }

        let mut digits = Vec::<u8, 5>::new();
        text::write_display(id.into(), &mut digits)?;

        self.port.write_all(&digits).await.map_err(Error::Io)?;
        self.sending = true;

        Ok(())
    }

    /// Append an argument in its text form.
    pub async fn send_cmd_arg(&mut self, arg: impl Display) -> Result<(), Error<Port::Error>> {
        let mut field = Vec::<u8, N>::new();
        text::write_display(arg, &mut field)?;

        self.send_field(&field).await
    }

    /// Append an argument as raw little-endian bytes.
    pub async fn send_cmd_bin_arg<T: BinArg>(&mut self, arg: &T) -> Result<(), Error<Port::Error>> {
        let mut buf = [0u8; MAX_BIN_SIZE];
        let field = buf.get_mut(..T::SIZE).ok_or(EndOfInput)?;
        arg.encode_bin(field.iter_mut())?;

        self.send_field(&buf[..T::SIZE]).await
    }

    /// Terminate the command and flush the port.
    pub async fn send_cmd_end(&mut self) -> Result<(), Error<Port::Error>> {
        if !core::mem::take(&mut self.sending) {
            Err(Error::NotStarted)?;
        }

        let command = self.separators.command;
        self.port.write_all(&[command]).await.map_err(Error::Io)?;

        if self.print_lf_cr {
            self.port.write_all(b"\r\n").await.map_err(Error::Io)?;
        }

        self.port.flush().await.map_err(Error::Io)
    }

    /// Send a command without arguments.
    pub async fn send_cmd(&mut self, id: impl Into<u16>) -> Result<(), Error<Port::Error>> {
        self.send_cmd_start(id).await?;
        self.send_cmd_end().await
    }

    /// Send a command with one text argument.
    pub async fn send_cmd_with(
        &mut self,
        id: impl Into<u16>,
        arg: impl Display,
    ) -> Result<(), Error<Port::Error>> {
        self.send_cmd_start(id).await?;
        self.send_cmd_arg(arg).await?;
        self.send_cmd_end().await
    }

    /// Send a command with one binary argument.
    pub async fn send_bin_cmd<T: BinArg>(
        &mut self,
        id: impl Into<u16>,
        arg: &T,
    ) -> Result<(), Error<Port::Error>> {
        self.send_cmd_start(id).await?;
        self.send_cmd_bin_arg(arg).await?;
        self.send_cmd_end().await
    }

    async fn send_field(&mut self, field: &[u8]) -> Result<(), Error<Port::Error>> {
        if !self.sending {
            Err(Error::NotStarted)?;
        }

        let Separators { field: sep, escape, .. } = self.separators;
        self.port.write_all(&[sep]).await.map_err(Error::Io)?;

        for (run, special) in self.separators.escape_runs(field) {
            self.port.write_all(run).await.map_err(Error::Io)?;

            if let Some(byte) = special {
                self.port.write_all(&[escape, byte]).await.map_err(Error::Io)?;
            }
        }

        Ok(())
    }
}

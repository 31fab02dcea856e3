//! The computer side of a link: commands by name, arguments as [`Value`]s.

use cmd_codec::{
    encoding::text,
    format::{self, Format},
    Board, Encoded, Value, MAX_ARGS,
};
use embassy_futures::select::{select, Either};
use embedded_hal_async::delay::DelayNs;
use embedded_io_async::{Read, Write};
use heapless::Vec;

use crate::{
    framing::{Frame, Inbox, Separators, Step},
    CommandTable, Error,
};

/// Name reported for received ids missing from the command table.
pub const UNKNOWN_COMMAND: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HostConfig {
    pub separators: Separators,
    /// Data widths of the device on the other end.
    pub board: Board,
    /// How long a receive waits for the link to speak.
    pub timeout_ms: u32,
    /// Log arguments that were coerced or guessed.
    pub warnings: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            separators: Separators::default(),
            board: Board::default(),
            timeout_ms: 1000,
            warnings: true,
        }
    }
}

/// A decoded command.
#[derive(Debug, Clone, PartialEq)]
pub struct Received<'a> {
    /// `None` when the id field was not a number.
    pub id: Option<u16>,
    pub name: &'a str,
    pub args: Vec<Value<'a>, MAX_ARGS>,
}

pub struct Host<'t, Port, Delay, const N: usize> {
    port: Port,
    delay: Delay,
    table: CommandTable<'t>,
    config: HostConfig,
    inbox: Inbox<N>,
    frame: Frame<N>,
}

impl<'t, Port, Delay, const N: usize> Host<'t, Port, Delay, N>
where
    Port: Read + Write,
    Delay: DelayNs,
{
    pub fn new(port: Port, delay: Delay, table: CommandTable<'t>, config: HostConfig) -> Self {
        Self {
            port,
            delay,
            table,
            inbox: Inbox::new(config.separators),
            frame: Frame::new(),
            config,
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn table(&self) -> &CommandTable<'t> {
        &self.table
    }

    pub fn port(&self) -> &Port {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut Port {
        &mut self.port
    }

    /// Send a command using the formats of its table entry.
    pub async fn send(&mut self, name: &str, args: &[Value<'_>]) -> Result<(), Error<Port::Error>> {
        let spec = *self.table.by_name(name).ok_or(Error::UnknownCommand)?;

        self.send_with_formats(name, args, spec.format).await
    }

    /// Send a command with the given formats instead of its table entry's.
    ///
    /// With no arguments only the command id is sent, whatever the formats.
    pub async fn send_with_formats(
        &mut self,
        name: &str,
        args: &[Value<'_>],
        formats: &str,
    ) -> Result<(), Error<Port::Error>> {
        let spec = *self.table.by_name(name).ok_or(Error::UnknownCommand)?;
        let formats = format::expand(formats, args.len())?;

        if !args.is_empty() && formats.len() != args.len() {
            Err(Error::ArgCount {
                formats: formats.len(),
                args: args.len(),
            })?;
        }

        let separators = self.config.separators;
        let mut message = Vec::<u8, N>::new();
        text::write_display(spec.id, &mut message)?;

        for (i, (&format, arg)) in formats.iter().zip(args).enumerate() {
            if format == Format::Char {
                if let Some(c) = arg.as_char().filter(char::is_ascii) {
                    let byte = c as u8;

                    if separators.needs_escape(byte) {
                        Err(Error::ControlChar)?;
                    }
                }
            }

            let mut field = Vec::<u8, N>::new();

            match self.config.board.encode(format, arg, &mut field)? {
                Encoded::Exact => {}
                Encoded::Coerced if self.config.warnings => {
                    warn!("argument {} of {} did not match its format and was coerced", i, name);
                }
                Encoded::Guessed if self.config.warnings => {
                    warn!("argument {} of {} sent without a format", i, name);
                }
                _ => {}
            }

            push(&mut message, &[separators.field])?;

            for (run, special) in separators.escape_runs(&field) {
                push(&mut message, run)?;

                if let Some(byte) = special {
                    push(&mut message, &[separators.escape, byte])?;
                }
            }
        }

        push(&mut message, &[separators.command])?;

        trace!("sending {} ({} bytes)", name, message.len());

        self.port.write_all(&message).await.map_err(Error::Io)?;
        self.port.flush().await.map_err(Error::Io)
    }

    /// Wait for a command and decode it with its table entry's formats.
    ///
    /// Returns `None` if nothing but whitespace arrived before the timeout.
    pub async fn receive(&mut self) -> Result<Option<Received<'_>>, Error<Port::Error>> {
        self.receive_inner(None).await
    }

    /// Wait for a command and decode it with the given formats.
    pub async fn receive_with_formats(
        &mut self,
        formats: &str,
    ) -> Result<Option<Received<'_>>, Error<Port::Error>> {
        self.receive_inner(Some(formats)).await
    }

    async fn receive_inner(
        &mut self,
        formats: Option<&str>,
    ) -> Result<Option<Received<'_>>, Error<Port::Error>> {
        loop {
            match self.inbox.poll() {
                Step::Complete => break,
                Step::Discarded => Err(Error::Overflow)?,
                Step::Incomplete => {}
            }

            let region = self.inbox.writable();

            if region.is_empty() {
                Err(Error::Overflow)?;
            }

            match select(self.port.read(region), self.delay.delay_ms(self.config.timeout_ms)).await {
                Either::First(count) => {
                    let count = count.map_err(Error::Io)?;
                    self.inbox.commit(count);
                }
                Either::Second(()) => {
                    let deframer = self.inbox.deframer_mut();

                    if !deframer.has_received() {
                        return Ok(None);
                    }

                    let blank = deframer.is_blank();
                    deframer.reset();

                    return if blank { Ok(None) } else { Err(Error::Incomplete) };
                }
            }
        }

        self.frame = self.inbox.take();
        self.decode(formats)
    }

    fn decode(&self, formats: Option<&str>) -> Result<Option<Received<'_>>, Error<Port::Error>> {
        let frame = &self.frame;
        let id = frame.command_id();
        let spec = id.and_then(|id| self.table.by_id(id));
        let arg_count = frame.len().saturating_sub(1);

        let formats = match (formats, spec) {
            (Some(formats), _) => format::expand(formats, arg_count)?,
            (None, Some(spec)) => format::expand(spec.format, arg_count)?,
            (None, None) => {
                if self.config.warnings {
                    warn!("unrecognized command {}, guessing argument formats", frame.command_text());
                }

                format::guesses(arg_count)?
            }
        };

        if arg_count > 0 && formats.len() != arg_count {
            Err(Error::ArgCount {
                formats: formats.len(),
                args: arg_count,
            })?;
        }

        let mut args = Vec::new();

        for (&format, field) in formats.iter().zip(frame.args()) {
            let value = self.config.board.decode(format, field)?;
            args.push(value).map_err(|_| Error::Overflow)?;
        }

        Ok(Some(Received {
            id,
            name: spec.map_or(UNKNOWN_COMMAND, |spec| spec.name),
            args,
        }))
    }
}

fn push<const N: usize, E>(message: &mut Vec<u8, N>, bytes: &[u8]) -> Result<(), Error<E>> {
    message.extend_from_slice(bytes).map_err(|_| Error::Overflow)
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;

    use super::*;
    use crate::{
        mock::{MockDelay, MockPort},
        CommandSpec,
    };

    const SPECS: &[CommandSpec<'static>] = &[
        CommandSpec::new(0, "multi_ping", "l*"),
        CommandSpec::new(1, "multi_pong", "l*"),
        CommandSpec::new(2, "who", "cs?"),
        CommandSpec::new(3, "reset", ""),
    ];

    type TestHost = Host<'static, MockPort<256>, MockDelay, 128>;

    fn host(config: HostConfig) -> TestHost {
        let table = CommandTable::new::<()>(SPECS).unwrap();

        Host::new(MockPort::new(), MockDelay::new(), table, config)
    }

    fn arm() -> HostConfig {
        HostConfig {
            board: Board::ARM32,
            ..Default::default()
        }
    }

    #[test]
    fn send_expands_star() {
        let mut host = host(arm());

        block_on(host.send("multi_ping", &[Value::Int(1), Value::Int(2)])).unwrap();

        // each NUL byte is escaped
        assert_eq!(
            &b"0,\x01/\0/\0/\0,\x02/\0/\0/\0;"[..],
            host.port().written()
        );
    }

    #[test]
    fn send_mixed_formats() {
        let mut host = host(HostConfig::default());

        block_on(host.send("who", &[Value::Char('x'), Value::Str("a;b"), Value::Bool(true)])).unwrap();

        assert_eq!(&b"2,x,a/;b,\x01;"[..], host.port().written());
    }

    #[test]
    fn send_without_args() {
        let mut host = host(HostConfig::default());

        block_on(host.send("who", &[])).unwrap();
        block_on(host.send("reset", &[])).unwrap();

        assert_eq!(&b"2;3;"[..], host.port().written());
    }

    #[test]
    fn send_errors() {
        let mut host = host(HostConfig::default());

        assert_eq!(
            Err(Error::UnknownCommand),
            block_on(host.send("double_ping", &[]))
        );
        assert_eq!(
            Err(Error::ArgCount { formats: 3, args: 1 }),
            block_on(host.send("who", &[Value::Char('x')]))
        );
        assert_eq!(
            Err(Error::ControlChar),
            block_on(host.send("who", &[Value::Char(';'), Value::Str(""), Value::Bool(false)]))
        );
        assert_eq!(
            Err(Error::ControlChar),
            block_on(host.send("who", &[Value::Char('\0'), Value::Str(""), Value::Bool(false)]))
        );
        assert_eq!(
            Err(Error::Codec(cmd_codec::error::Error::Overflow)),
            block_on(host.send_with_formats("reset", &[Value::Int(70_000)], "i"))
        );

        assert!(host.port().written().is_empty());
    }

    #[test]
    fn receive_known() {
        let mut host = host(arm());

        let mut input = Vec::<u8, 64>::new();
        input.extend_from_slice(b"1,").unwrap();
        input.extend_from_slice(&7i32.to_le_bytes()).unwrap();
        input.extend_from_slice(b",").unwrap();
        input.extend_from_slice(&(-3i32).to_le_bytes()).unwrap();
        input.extend_from_slice(b";").unwrap();
        host.port_mut().feed(&input).unwrap();

        let received = block_on(host.receive()).unwrap().unwrap();

        assert_eq!(Some(1), received.id);
        assert_eq!("multi_pong", received.name);
        assert_eq!(&[Value::Int(7), Value::Int(-3)], received.args.as_slice());
    }

    #[test]
    fn receive_unknown_guesses() {
        let mut host = host(HostConfig::default());

        host.port_mut().feed(b"\r\n9,12,2.5,hi;").unwrap();

        let received = block_on(host.receive()).unwrap().unwrap();

        assert_eq!(Some(9), received.id);
        assert_eq!(UNKNOWN_COMMAND, received.name);
        assert_eq!(
            &[Value::Int(12), Value::Float(2.5), Value::Str("hi")],
            received.args.as_slice()
        );
    }

    #[test]
    fn receive_with_override() {
        let mut host = host(HostConfig::default());

        host.port_mut().feed(b"3,x,5;").unwrap();

        let received = block_on(host.receive_with_formats("cs")).unwrap().unwrap();

        assert_eq!("reset", received.name);
        assert_eq!(&[Value::Char('x'), Value::Str("5")], received.args.as_slice());
    }

    #[test]
    fn receive_format_mismatch() {
        let mut host = host(HostConfig::default());

        host.port_mut().feed(b"3,x;").unwrap();

        assert_eq!(
            Err(Error::ArgCount { formats: 0, args: 1 }),
            block_on(host.receive())
        );
    }

    #[test]
    fn receive_timeouts() {
        let mut host = host(HostConfig::default());

        // silence
        assert_eq!(Ok(None), block_on(host.receive()));

        // whitespace only
        host.port_mut().feed(b"\r\n").unwrap();
        assert_eq!(Ok(None), block_on(host.receive()));

        // half a command
        host.port_mut().feed(b"1,2").unwrap();
        assert_eq!(Err(Error::Incomplete), block_on(host.receive()));

        // the partial command is not glued to the next one
        host.port_mut().feed(b"0;").unwrap();
        let received = block_on(host.receive()).unwrap().unwrap();
        assert_eq!(Some(0), received.id);
        drop(received);

        assert!(host.delay.requested_ms().iter().all(|&ms| ms == 1000));
    }

    #[test]
    fn receive_in_pieces() {
        let table = CommandTable::new::<()>(SPECS).unwrap();
        let port = MockPort::<256>::new().chunked(2);
        let mut host: TestHost = Host::new(port, MockDelay::new(), table, arm());

        host.port_mut().feed(b"0,/\0/\0/\0/\0;").unwrap();

        let received = block_on(host.receive()).unwrap().unwrap();

        assert_eq!("multi_ping", received.name);
        assert_eq!(&[Value::Int(0)], received.args.as_slice());
    }
}

//! Command framing.
//!
//! A command travels as `id,arg,arg;` where any argument byte that collides
//! with a separator, the escape character or NUL is prefixed with the escape
//! character. [`Deframer`] undoes this one byte at a time.

use heapless::Vec;

use cmd_codec::MAX_ARGS;

use crate::rx_buffer::RxBuffer;

/// The three framing characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Separators {
    pub field: u8,
    pub command: u8,
    pub escape: u8,
}

impl Default for Separators {
    fn default() -> Self {
        Self::new(b',', b';', b'/')
    }
}

impl Separators {
    pub const fn new(field: u8, command: u8, escape: u8) -> Self {
        Self {
            field,
            command,
            escape,
        }
    }

    /// Whether `byte` must be escaped inside an argument.
    #[inline]
    pub const fn needs_escape(&self, byte: u8) -> bool {
        byte == self.field || byte == self.command || byte == self.escape || byte == 0
    }

    /// Split `bytes` into runs that can be written verbatim, each paired with
    /// the byte that ended it (if any), which must be written escaped.
    pub fn escape_runs<'a>(&'a self, bytes: &'a [u8]) -> impl Iterator<Item = (&'a [u8], Option<u8>)> + 'a {
        let mut rest = Some(bytes);

        core::iter::from_fn(move || {
            let bytes = rest.take()?;

            match bytes.iter().position(|&b| self.needs_escape(b)) {
                Some(i) => {
                    rest = Some(&bytes[i + 1..]);
                    Some((&bytes[..i], Some(bytes[i])))
                }
                None => Some((bytes, None)),
            }
        })
    }
}

/// A received command: unescaped bytes split into fields.
///
/// Field 0 is the command id, the rest are arguments.
#[derive(Debug, Default)]
pub struct Frame<const N: usize> {
    data: Vec<u8, N>,
    ends: Vec<usize, { MAX_ARGS + 1 }>,
}

impl<const N: usize> Frame<N> {
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            ends: Vec::new(),
        }
    }

    /// Number of fields, including the command id.
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    pub fn field(&self, index: usize) -> Option<&[u8]> {
        let end = *self.ends.get(index)?;
        let start = match index {
            0 => 0,
            _ => self.ends[index - 1],
        };

        self.data.get(start..end)
    }

    pub fn fields(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.len()).filter_map(|i| self.field(i))
    }

    /// The argument fields.
    pub fn args(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.fields().skip(1)
    }

    /// The command id, ignoring surrounding whitespace such as the line
    /// ending of a previous command.
    pub fn command_id(&self) -> Option<u16> {
        core::str::from_utf8(self.field(0)?).ok()?.trim().parse().ok()
    }

    /// The raw text of the command id field.
    pub fn command_text(&self) -> &str {
        self.field(0)
            .and_then(|field| core::str::from_utf8(field).ok())
            .map(str::trim)
            .unwrap_or("")
    }

    fn clear(&mut self) {
        self.data.clear();
        self.ends.clear();
    }

    fn push_byte(&mut self, byte: u8) -> Result<(), ()> {
        self.data.push(byte).map_err(drop)
    }

    fn close_field(&mut self) -> Result<(), ()> {
        self.ends.push(self.data.len()).map_err(drop)
    }
}

/// Outcome of feeding one byte to a [`Deframer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// More bytes are needed.
    Incomplete,
    /// A frame is ready to be taken.
    Complete,
    /// A frame ended that did not fit and was dropped.
    Discarded,
}

/// Incremental, escape-aware frame parser.
#[derive(Debug)]
pub struct Deframer<const N: usize> {
    separators: Separators,
    frame: Frame<N>,
    escaped: bool,
    overflowed: bool,
    received: bool,
    blank: bool,
}

impl<const N: usize> Deframer<N> {
    pub const fn new(separators: Separators) -> Self {
        Self {
            separators,
            frame: Frame::new(),
            escaped: false,
            overflowed: false,
            received: false,
            blank: true,
        }
    }

    pub fn separators(&self) -> &Separators {
        &self.separators
    }

    pub fn push(&mut self, byte: u8) -> Step {
        self.received = true;
        self.blank &= byte.is_ascii_whitespace();

        if self.escaped {
            self.escaped = false;

            // a lone escape before an ordinary byte is kept as is
            if !self.separators.needs_escape(byte) {
                self.append(self.separators.escape);
            }
            self.append(byte);

            return Step::Incomplete;
        }

        if byte == self.separators.escape {
            self.escaped = true;
        } else if byte == self.separators.field {
            self.end_field();
        } else if byte == self.separators.command {
            self.end_field();

            return if core::mem::take(&mut self.overflowed) {
                self.reset();
                Step::Discarded
            } else {
                Step::Complete
            };
        } else {
            self.append(byte);
        }

        Step::Incomplete
    }

    /// Take the completed frame and start over.
    pub fn take(&mut self) -> Frame<N> {
        let frame = core::mem::take(&mut self.frame);
        self.reset();
        frame
    }

    /// Whether any byte has arrived since the last frame.
    pub fn has_received(&self) -> bool {
        self.received
    }

    /// Whether everything since the last frame was whitespace.
    pub fn is_blank(&self) -> bool {
        self.blank
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.frame.clear();
        self.escaped = false;
        self.overflowed = false;
        self.received = false;
        self.blank = true;
    }

    fn append(&mut self, byte: u8) {
        if !self.overflowed && self.frame.push_byte(byte).is_err() {
            self.overflowed = true;
        }
    }

    fn end_field(&mut self) {
        if !self.overflowed && self.frame.close_field().is_err() {
            self.overflowed = true;
        }
    }
}

/// Received bytes awaiting deframing, plus the deframer state.
pub struct Inbox<const N: usize> {
    rx: RxBuffer<N>,
    deframer: Deframer<N>,
}

impl<const N: usize> Inbox<N> {
    pub const fn new(separators: Separators) -> Self {
        Self {
            rx: RxBuffer::new(),
            deframer: Deframer::new(separators),
        }
    }

    /// Free space for a port to read into. Follow with
    /// [`commit`](Self::commit).
    pub fn writable(&mut self) -> &mut [u8] {
        self.rx.writable()
    }

    pub fn commit(&mut self, count: usize) {
        self.rx.commit(count);
    }

    /// Deframe buffered bytes until a frame ends, leaving the rest buffered.
    pub fn poll(&mut self) -> Step {
        let mut iter = self.rx.iter();
        let mut step = Step::Incomplete;

        for byte in &mut iter {
            step = self.deframer.push(byte);

            if step != Step::Incomplete {
                break;
            }
        }

        let memento = iter.capture();
        self.rx.flush(memento);

        step
    }

    /// The frame completed by the last [`poll`](Self::poll).
    pub fn take(&mut self) -> Frame<N> {
        self.deframer.take()
    }

    pub fn deframer(&self) -> &Deframer<N> {
        &self.deframer
    }

    pub fn deframer_mut(&mut self) -> &mut Deframer<N> {
        &mut self.deframer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deframe<const N: usize>(bytes: &[u8]) -> (Step, Deframer<N>) {
        let mut deframer = Deframer::new(Separators::default());
        let mut step = Step::Incomplete;

        for &byte in bytes {
            step = deframer.push(byte);
        }

        (step, deframer)
    }

    #[test]
    fn fields() {
        let (step, mut deframer) = deframe::<32>(b"1,abc,,de;");
        assert_eq!(Step::Complete, step);

        let frame = deframer.take();

        assert_eq!(4, frame.len());
        assert_eq!(Some(1), frame.command_id());
        assert!(frame
            .args()
            .eq([&b"abc"[..], &b""[..], &b"de"[..]].into_iter()));
    }

    #[test]
    fn no_args() {
        let (step, mut deframer) = deframe::<8>(b"7;");
        assert_eq!(Step::Complete, step);

        let frame = deframer.take();

        assert_eq!(1, frame.len());
        assert_eq!(Some(7), frame.command_id());
        assert_eq!(0, frame.args().count());
    }

    #[test]
    fn escapes() {
        let (step, mut deframer) = deframe::<32>(b"0,a/,b/;c///\0;");
        assert_eq!(Step::Complete, step);

        let frame = deframer.take();

        assert_eq!(Some(&b"a,b;c/\0"[..]), frame.field(1));
    }

    #[test]
    fn lone_escape_is_kept() {
        let (_, mut deframer) = deframe::<32>(b"0,a/b;");

        assert_eq!(Some(&b"a/b"[..]), deframer.take().field(1));
    }

    #[test]
    fn line_endings_around_id() {
        let (_, mut deframer) = deframe::<32>(b"\r\n 12,x;");
        let frame = deframer.take();

        assert_eq!(Some(12), frame.command_id());
        assert_eq!("12", frame.command_text());
    }

    #[test]
    fn unparsable_id() {
        let (_, mut deframer) = deframe::<32>(b"kAck,x;");
        let frame = deframer.take();

        assert_eq!(None, frame.command_id());
        assert_eq!("kAck", frame.command_text());
    }

    #[test]
    fn overflow_discards_until_terminator() {
        let mut deframer = Deframer::<4>::new(Separators::default());

        let steps: heapless::Vec<Step, 16> = b"0,toolong;1,ok;".iter().map(|&b| deframer.push(b)).collect();

        assert_eq!(Some(&Step::Discarded), steps.get(9));
        assert_eq!(Some(&Step::Complete), steps.last());

        let frame = deframer.take();
        assert_eq!(Some(1), frame.command_id());
        assert_eq!(Some(&b"ok"[..]), frame.field(1));
    }

    #[test]
    fn blank_and_received() {
        let mut deframer = Deframer::<8>::new(Separators::default());
        assert!(!deframer.has_received());
        assert!(deframer.is_blank());

        deframer.push(b'\r');
        deframer.push(b'\n');
        assert!(deframer.has_received());
        assert!(deframer.is_blank());

        deframer.push(b'1');
        assert!(!deframer.is_blank());

        deframer.reset();
        assert!(!deframer.has_received());
    }

    #[test]
    fn inbox_keeps_trailing_bytes() {
        let mut inbox = Inbox::<16>::new(Separators::default());

        let region = inbox.writable();
        region[..7].copy_from_slice(b"1,a;2,b");
        inbox.commit(7);

        assert_eq!(Step::Complete, inbox.poll());
        assert_eq!(Some(1), inbox.take().command_id());

        assert_eq!(Step::Incomplete, inbox.poll());
        assert!(inbox.deframer().has_received());

        inbox.writable()[0] = b';';
        inbox.commit(1);

        assert_eq!(Step::Complete, inbox.poll());
        assert_eq!(Some(&b"b"[..]), inbox.take().field(1));
    }

    #[test]
    fn escape_runs() {
        let separators = Separators::default();

        let runs: heapless::Vec<_, 8> = separators.escape_runs(b"ab,c\0").collect();

        assert_eq!(
            [
                (&b"ab"[..], Some(b',')),
                (&b"c"[..], Some(0)),
                (&b""[..], None)
            ],
            runs.as_slice()
        );

        let runs: heapless::Vec<_, 8> = separators.escape_runs(b"plain").collect();
        assert_eq!([(&b"plain"[..], None)], runs.as_slice());
    }

    #[test]
    fn custom_separators() {
        let mut deframer = Deframer::<16>::new(Separators::new(b':', b'\n', b'\\'));

        let mut step = Step::Incomplete;
        for &byte in b"3:x\\:y\n" {
            step = deframer.push(byte);
        }

        assert_eq!(Step::Complete, step);
        assert_eq!(Some(&b"x:y"[..]), deframer.take().field(1));
    }
}

use cmd_codec::{error as codec, format};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The port reported an error.
    Io(E),
    /// A frame did not fit the buffers and was discarded.
    Overflow,
    /// The link went quiet in the middle of a frame.
    Incomplete,
    /// The command name is not in the command table.
    UnknownCommand,
    /// Read past the last argument of the current command.
    MissingArg,
    /// An argument was added without a started command.
    NotStarted,
    /// Format and argument counts disagree.
    ArgCount { formats: usize, args: usize },
    /// A framing character cannot be sent as a lone `char` argument.
    ControlChar,
    /// Two commands share an id or a name.
    DuplicateCommand,
    /// The callback table is at capacity.
    TableFull,
    Codec(codec::Error),
    Format(format::Error),
}

impl<E> From<codec::Error> for Error<E> {
    fn from(value: codec::Error) -> Self {
        Self::Codec(value)
    }
}

impl<E> From<codec::EndOfInput> for Error<E> {
    fn from(value: codec::EndOfInput) -> Self {
        Self::Codec(value.into())
    }
}

impl<E> From<codec::Invalid> for Error<E> {
    fn from(value: codec::Invalid) -> Self {
        Self::Codec(value.into())
    }
}

impl<E> From<format::Error> for Error<E> {
    fn from(value: format::Error) -> Self {
        Self::Format(value)
    }
}

impl<E> Error<E> {
    /// Whether the port itself failed, as opposed to a protocol problem.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

use crate::Error;

pub use cmd_macros::Commands;

/// One entry of a command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandSpec<'a> {
    pub id: u16,
    pub name: &'a str,
    pub format: &'a str,
}

impl<'a> CommandSpec<'a> {
    pub const fn new(id: u16, name: &'a str, format: &'a str) -> Self {
        Self { id, name, format }
    }
}

/// A closed set of commands known at compile time.
///
/// Usually derived with [`Commands`]:
///
/// ```ignore
/// #[derive(Clone, Copy, Commands)]
/// enum Command {
///     #[format("ddd")]
///     DoublePing,
///     #[format("ddd")]
///     DoublePong,
/// }
/// ```
pub trait CommandSet: Sized + Copy {
    /// Every command, in id order.
    const SPECS: &'static [CommandSpec<'static>];

    fn id(self) -> u16;
    fn from_id(id: u16) -> Option<Self>;
    fn name(self) -> &'static str;
    fn format(self) -> &'static str;
}

/// An ordered list of command specs with unique ids and names.
#[derive(Debug, Clone, Copy)]
pub struct CommandTable<'a> {
    specs: &'a [CommandSpec<'a>],
}

impl<'a> CommandTable<'a> {
    pub fn new<E>(specs: &'a [CommandSpec<'a>]) -> Result<Self, Error<E>> {
        for (i, spec) in specs.iter().enumerate() {
            if specs[..i]
                .iter()
                .any(|other| other.id == spec.id || other.name == spec.name)
            {
                return Err(Error::DuplicateCommand);
            }
        }

        Ok(Self { specs })
    }

    /// The table of a derived command set.
    pub fn of<C: CommandSet, E>() -> Result<CommandTable<'static>, Error<E>> {
        CommandTable::new(C::SPECS)
    }

    pub fn by_name(&self, name: &str) -> Option<&CommandSpec<'a>> {
        self.specs.iter().find(|spec| spec.name == name)
    }

    pub fn by_id(&self, id: u16) -> Option<&CommandSpec<'a>> {
        self.specs.iter().find(|spec| spec.id == id)
    }

    pub fn specs(&self) -> &[CommandSpec<'a>] {
        self.specs
    }
}

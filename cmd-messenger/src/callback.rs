use embedded_io_async::{Read, Write};
use heapless::LinearMap;

use crate::{Error, Messenger};

pub use cmd_macros::callbacks;

/// A handler invoked when its command arrives.
///
/// The messenger is positioned on the command's first argument, so the
/// handler reads its arguments and may send replies through it.
///
/// Several handler types can share one [`CallbackTable`] by gathering them
/// in an enum marked with [`callbacks`].
#[allow(async_fn_in_trait)]
pub trait Callback<Port: Read + Write, const N: usize> {
    async fn call(&mut self, messenger: &mut Messenger<Port, N>) -> Result<(), Error<Port::Error>>;
}

/// Command id to handler mapping, with an optional fallback.
pub struct CallbackTable<H, const K: usize> {
    handlers: LinearMap<u16, H, K>,
    default: Option<H>,
}

impl<H, const K: usize> Default for CallbackTable<H, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H, const K: usize> CallbackTable<H, K> {
    pub const fn new() -> Self {
        Self {
            handlers: LinearMap::new(),
            default: None,
        }
    }

    /// Register `handler` for `id`, replacing any previous one.
    pub fn attach<E>(&mut self, id: impl Into<u16>, handler: impl Into<H>) -> Result<(), Error<E>> {
        self.handlers
            .insert(id.into(), handler.into())
            .map_err(|_| Error::TableFull)?;

        Ok(())
    }

    /// Register the handler for commands with no handler of their own.
    pub fn attach_default(&mut self, handler: impl Into<H>) {
        self.default = Some(handler.into());
    }

    /// The handler for `id`, or the default one when `id` is unknown or
    /// could not be parsed.
    pub fn lookup(&mut self, id: Option<u16>) -> Option<&mut H> {
        match id {
            Some(id) if self.handlers.contains_key(&id) => self.handlers.get_mut(&id),
            _ => self.default.as_mut(),
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

use proc_macro::TokenStream;

mod callbacks;
mod commands;

/// Derive a command identifier table for a unit-only enum.
///
/// Identifiers follow the enum's discriminants, names are the snake_case
/// variant names, and `#[format("...")]` attaches an argument format string.
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
///
/// # Note
///
/// Requires `cmd_messenger` to be in scope with that name.
#[proc_macro_derive(Commands, attributes(format))]
pub fn commands(item: TokenStream) -> TokenStream {
    commands::commands(item)
}

/// Turn the attached enum into a callback bundle.
///
/// Each variant holds one handler type (a unit variant names its own type).
/// The bundle implements `Callback` by forwarding to whichever handler it
/// holds, so one callback table can carry handlers of different types
/// without dynamic dispatch.
///
/// # Note
///
/// Requires `cmd_messenger` to be in scope with that name.
#[proc_macro_attribute]
pub fn callbacks(attr: TokenStream, item: TokenStream) -> TokenStream {
    callbacks::callbacks(attr, item)
}

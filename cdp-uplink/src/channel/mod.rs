//! Interactive shell channel with prompt detection.
//!
//! Device output is accumulated with ANSI escapes stripped and only the tail
//! of the buffer is searched for the prompt.

mod buffer;
mod shell;

pub use buffer::PromptBuffer;
pub use shell::{ShellChannel, ShellIo};

#[cfg(test)]
pub(crate) use shell::testing;

//! Output buffer with tail-only prompt search.
//!
//! Prompts only ever appear at the end of what the device has sent so far,
//! so a match is looked for in the last `search_depth` bytes rather than in
//! the whole output.

use std::fmt;

use bytes::BytesMut;
use regex::bytes::Regex;
use vte::{Parser, Perform};

/// Accumulates shell output and finds the prompt at its tail.
pub struct PromptBuffer {
    buffer: BytesMut,
    search_depth: usize,
    parser: Parser,
}

impl PromptBuffer {
    /// Create a buffer searching the last `search_depth` bytes for prompts.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            search_depth,
            parser: Parser::new(),
        }
    }

    /// Append device output.
    ///
    /// Escape sequences and control characters other than `\n` and `\t`
    /// are dropped, so `\r\n` line endings arrive as `\n`. The parser keeps
    /// its state between calls; a sequence split across two reads is still
    /// removed.
    pub fn extend(&mut self, data: &[u8]) {
        let mut printable = Printable(&mut self.buffer);
        self.parser.advance(&mut printable, data);
    }

    /// Find `pattern` in the tail of the buffer.
    ///
    /// Returns the end offset of the match in the full buffer.
    pub fn search_tail(&self, pattern: &Regex) -> Option<usize> {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        pattern.find(&self.buffer[start..]).map(|m| start + m.end())
    }

    /// Remove and return everything up to `end`, keeping the rest.
    pub fn take_through(&mut self, end: usize) -> Vec<u8> {
        let end = end.min(self.buffer.len());
        self.buffer.split_to(end).to_vec()
    }

    /// Buffer contents as a string (lossy UTF-8).
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }
}

impl Default for PromptBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl fmt::Debug for PromptBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptBuffer")
            .field("len", &self.buffer.len())
            .field("search_depth", &self.search_depth)
            .finish()
    }
}

struct Printable<'a>(&'a mut BytesMut);

impl Perform for Printable<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.0.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\t') {
            self.0.extend_from_slice(&[byte]);
        }
    }
}

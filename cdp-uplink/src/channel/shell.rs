//! Shell channel: write lines, read until a prompt.

use std::future::Future;
use std::time::Duration;

use log::trace;
use regex::bytes::Regex;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use tokio::time::Instant;

use super::buffer::PromptBuffer;
use crate::error::{ChannelError, Result, TransportError};

/// Byte pipe underneath a [`ShellChannel`].
///
/// Implemented for russh's client channel; anything that can deliver
/// [`ChannelMsg`]s and accept input can stand in for it.
pub trait ShellIo: Send {
    /// Write raw input to the shell.
    fn send_data(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Next message from the device, `None` once the channel is gone.
    fn recv(&mut self) -> impl Future<Output = Option<ChannelMsg>> + Send;

    /// Close the pipe.
    fn shutdown(&mut self) -> impl Future<Output = Result<()>> + Send;
}

impl ShellIo for Channel<Msg> {
    async fn send_data(&mut self, data: &[u8]) -> Result<()> {
        self.data(data).await.map_err(ChannelError::Ssh)?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<ChannelMsg> {
        self.wait().await
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.close().await.map_err(ChannelError::Ssh)?;
        Ok(())
    }
}

/// Interactive shell on a channel.
pub struct ShellChannel<T = Channel<Msg>> {
    io: T,
    buffer: PromptBuffer,
    timeout: Duration,
}

impl<T: ShellIo> ShellChannel<T> {
    /// Wrap an opened shell channel.
    pub fn new(io: T, timeout: Duration) -> Self {
        Self {
            io,
            buffer: PromptBuffer::default(),
            timeout,
        }
    }

    /// Send one line of input.
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        trace!("> {}", line);
        self.write_line(line).await
    }

    /// Send one line of input without logging it.
    pub async fn send_secret(&mut self, secret: &str) -> Result<()> {
        trace!("> ********");
        self.write_line(secret).await
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        let data = format!("{line}\n");
        self.io.send_data(data.as_bytes()).await
    }

    /// Read until `pattern` matches the tail of the output.
    ///
    /// Returns everything up to and including the match. Hitting the
    /// deadline is a [`TransportError::Timeout`]; the device closing the
    /// channel first is [`ChannelError::Closed`].
    pub async fn read_until(&mut self, pattern: &Regex) -> Result<String> {
        let deadline = Instant::now() + self.timeout;

        loop {
            if let Some(end) = self.buffer.search_tail(pattern) {
                let data = self.buffer.take_through(end);
                return Ok(String::from_utf8_lossy(&data).into_owned());
            }

            let msg = tokio::time::timeout_at(deadline, self.io.recv())
                .await
                .map_err(|_| TransportError::Timeout(self.timeout))?;

            match msg {
                Some(ChannelMsg::Data { data }) => self.buffer.extend(&data),
                Some(ChannelMsg::ExtendedData { data, .. }) => self.buffer.extend(&data),
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    trace!("channel closed with {:?} unread", self.buffer.as_str_lossy());
                    return Err(ChannelError::Closed.into());
                }
                Some(_) => {}
            }
        }
    }

    /// Send a line and read until `pattern`.
    pub async fn exchange(&mut self, line: &str, pattern: &Regex) -> Result<String> {
        self.send_line(line).await?;
        self.read_until(pattern).await
    }

    /// Close the channel.
    pub async fn close(mut self) -> Result<()> {
        self.io.shutdown().await
    }
}

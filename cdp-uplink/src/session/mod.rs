//! Device sessions.
//!
//! A [`Connector`] opens a [`DeviceSession`] for one inventory entry. The
//! rollout only talks to these traits; [`SshConnector`] is the production
//! implementation. The CLI dialogue itself lives in [`ShellSession`], which
//! runs over any [`ShellIo`](crate::channel::ShellIo).

mod shell;
mod ssh;

pub use shell::ShellSession;
pub use ssh::{SshConnector, SshSession};

use std::future::Future;

use crate::error::Result;
use crate::inventory::DeviceDescriptor;

/// Opens sessions to devices.
pub trait Connector: Send + Sync {
    /// Session type produced by this connector.
    type Session: DeviceSession;

    /// Connect and log in to `device` with its attached credentials.
    fn connect(&self, device: &DeviceDescriptor) -> impl Future<Output = Result<Self::Session>> + Send;
}

/// An open CLI session on one device.
pub trait DeviceSession: Send {
    /// Address of the connected device.
    fn host(&self) -> &str;

    /// Run a command and return its output.
    fn run(&mut self, command: &str) -> impl Future<Output = Result<String>> + Send;

    /// Apply configuration lines in order, inside configuration mode.
    ///
    /// Returns the transcript of the configuration session.
    fn configure(&mut self, lines: &[String]) -> impl Future<Output = Result<String>> + Send;

    /// Persist the running configuration.
    fn save(&mut self) -> impl Future<Output = Result<String>> + Send {
        async move { self.run("write memory").await }
    }

    /// Write an informational message to the device log.
    fn log_remote(&mut self, message: &str) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.run(&format!("send log 6 \"{message}\"")).await?;
            Ok(())
        }
    }

    /// Close the session.
    fn disconnect(self) -> impl Future<Output = Result<()>> + Send;
}

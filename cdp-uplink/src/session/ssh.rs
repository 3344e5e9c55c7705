//! SSH-backed device sessions.

use russh::Channel;
use russh::client::Msg;

use super::{Connector, DeviceSession, ShellSession};
use crate::channel::ShellChannel;
use crate::error::{ConfigError, Result};
use crate::inventory::DeviceDescriptor;
use crate::platform::Platform;
use crate::transport::{SshConfig, SshTransport, Target};

/// Opens SSH sessions using shared settings.
#[derive(Debug, Clone, Default)]
pub struct SshConnector {
    config: SshConfig,
}

impl SshConnector {
    /// Create a connector with the given SSH settings.
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }
}

impl Connector for SshConnector {
    type Session = SshSession;

    async fn connect(&self, device: &DeviceDescriptor) -> Result<SshSession> {
        let credentials = device
            .credentials()
            .ok_or(ConfigError::MissingCredentials { field: "username" })?;
        let platform = Platform::for_device_type(&device.device_type)?;

        let target = Target {
            host: &device.ip,
            port: device.port.unwrap_or(self.config.port),
            username: credentials.username(),
            password: credentials.password(),
        };

        let transport = SshTransport::connect(&self.config, target).await?;
        let channel = match transport
            .open_shell(self.config.terminal_width, self.config.terminal_height)
            .await
        {
            Ok(channel) => channel,
            Err(e) => {
                transport.close().await.ok();
                return Err(e);
            }
        };

        let shell = ShellChannel::new(channel, self.config.timeout);
        let mut session = SshSession {
            cli: ShellSession::new(transport.host(), shell, platform),
            transport,
        };

        if let Err(e) = session.cli.prepare(device.secret()).await {
            session.disconnect().await.ok();
            return Err(e);
        }

        Ok(session)
    }
}

/// A logged-in shell on one device over SSH.
pub struct SshSession {
    transport: SshTransport,
    cli: ShellSession<Channel<Msg>>,
}

impl DeviceSession for SshSession {
    fn host(&self) -> &str {
        self.cli.host()
    }

    async fn run(&mut self, command: &str) -> Result<String> {
        self.cli.run(command).await
    }

    async fn configure(&mut self, lines: &[String]) -> Result<String> {
        self.cli.configure(lines).await
    }

    async fn save(&mut self) -> Result<String> {
        self.cli.save().await
    }

    async fn log_remote(&mut self, message: &str) -> Result<()> {
        self.cli.log_remote(message).await
    }

    async fn disconnect(self) -> Result<()> {
        let shell_closed = self.cli.disconnect().await;
        self.transport.close().await?;
        shell_closed
    }
}

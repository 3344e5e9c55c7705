//! SSH transport implementation using russh.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use russh::Channel;
use russh::client::{self, Handle, Msg};
use russh::keys::PublicKey;

use super::config::{HostKeyVerification, SshConfig, Target};
use crate::error::{ChannelError, Result, TransportError};

/// An authenticated SSH connection to one device.
pub struct SshTransport {
    session: Handle<SshHandler>,
    host: String,
}

impl SshTransport {
    /// Connect to the device and authenticate with a password.
    ///
    /// A TCP connect that times out or is refused surfaces as
    /// [`TransportError::Timeout`] / [`TransportError::ConnectionFailed`];
    /// rejected credentials as [`TransportError::AuthenticationFailed`].
    pub async fn connect(config: &SshConfig, target: Target<'_>) -> Result<Self> {
        let client_config = Arc::new(client::Config {
            inactivity_timeout: Some(config.timeout),
            ..Default::default()
        });

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));

        let handler = SshHandler {
            host: target.host.to_string(),
            port: target.port,
            verification: config.host_key_verification,
            known_hosts_path: config.known_hosts_path.clone(),
            host_key_error: host_key_error.clone(),
        };

        debug!("Connecting to {}:{}", target.host, target.port);
        let connected = tokio::time::timeout(
            config.timeout,
            client::connect(client_config, (target.host, target.port), handler),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?;

        let mut session = connected.map_err(|e| {
            // A rejected host key carries a more useful error than russh's.
            let stored = host_key_error.lock().ok().and_then(|mut slot| slot.take());
            match (stored, e) {
                (Some(hk_err), _) => hk_err,
                (None, russh::Error::IO(source)) => TransportError::ConnectionFailed {
                    host: target.host.to_string(),
                    port: target.port,
                    source,
                },
                (None, e) => TransportError::Ssh(e),
            }
        })?;

        let authenticated = tokio::time::timeout(
            config.timeout,
            session.authenticate_password(target.username, target.password),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(TransportError::Ssh)?
        .success();

        if !authenticated {
            return Err(TransportError::AuthenticationFailed {
                user: target.username.to_string(),
            }
            .into());
        }

        Ok(Self {
            session,
            host: target.host.to_string(),
        })
    }

    /// Open a PTY with an interactive shell on this connection.
    pub async fn open_shell(&self, width: u32, height: u32) -> Result<Channel<Msg>> {
        let channel = self
            .session
            .channel_open_session()
            .await
            .map_err(ChannelError::Ssh)?;

        channel
            .request_pty(true, "xterm", width, height, 0, 0, &[])
            .await
            .map_err(ChannelError::Ssh)?;

        channel
            .request_shell(true)
            .await
            .map_err(ChannelError::Ssh)?;

        Ok(channel)
    }

    /// The device address this transport is connected to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Close the connection.
    pub async fn close(self) -> Result<()> {
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// SSH client handler for russh.
struct SshHandler {
    host: String,
    port: u16,
    verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    /// `Ok(true)` if known and matching, `Ok(false)` if unknown.
    fn check_known_hosts(&self, pubkey: &PublicKey) -> std::result::Result<bool, TransportError> {
        let result = match self.known_hosts_path {
            Some(ref path) => russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path),
            None => russh::keys::check_known_hosts(&self.host, self.port, pubkey),
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    fn learn_host_key(&self, pubkey: &PublicKey) -> std::result::Result<(), TransportError> {
        let result = match self.known_hosts_path {
            Some(ref path) => {
                russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, pubkey, path)
            }
            None => russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, pubkey),
        };
        result.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }

    fn reject(&self, error: TransportError) -> bool {
        if let Ok(mut slot) = self.host_key_error.lock() {
            *slot = Some(error);
        }
        false
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        if self.verification == HostKeyVerification::Disabled {
            return Ok(true);
        }

        let accepted = match (self.verification, self.check_known_hosts(server_public_key)) {
            (_, Ok(true)) => true,
            (HostKeyVerification::AcceptNew, Ok(false)) => {
                if let Err(e) = self.learn_host_key(server_public_key) {
                    warn!("Failed to save host key for {}: {}", self.host, e);
                }
                true
            }
            (_, Ok(false)) => self.reject(TransportError::HostKeyUnknown {
                host: self.host.clone(),
                port: self.port,
            }),
            (_, Err(e)) => self.reject(e),
        };
        Ok(accepted)
    }
}

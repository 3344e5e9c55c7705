//! Error types for cdp-uplink.
//!
//! Errors are grouped by layer and unified in [`Error`]. Whether a failure
//! only costs the current device or ends the whole run is decided in one
//! place, [`Error::session_failure`].

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for cdp-uplink operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Shell channel errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Device type errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// CDP neighbor output could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Device inventory errors
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Run configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Result report errors
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// The operator interrupted the run
    #[error("Interrupted")]
    Interrupted,
}

/// The transport failures a rollout tolerates on a single device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFailure {
    /// The device did not answer in time or could not be reached.
    Timeout,
    /// The device rejected the credentials.
    AuthFailure,
}

impl fmt::Display for SessionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionFailure::Timeout => write!(f, "timeout"),
            SessionFailure::AuthFailure => write!(f, "authentication failure"),
        }
    }
}

impl Error {
    /// Classify this error as a per-device session failure.
    ///
    /// Returns `None` for everything that must abort the run.
    pub fn session_failure(&self) -> Option<SessionFailure> {
        match self {
            Error::Transport(TransportError::Timeout(_))
            | Error::Transport(TransportError::ConnectionFailed { .. }) => {
                Some(SessionFailure::Timeout)
            }
            Error::Transport(TransportError::AuthenticationFailed { .. }) => {
                Some(SessionFailure::AuthFailure)
            }
            _ => None,
        }
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Host key does not match the known_hosts entry
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Host is not in known_hosts and strict checking is on
    #[error("Host key for {host}:{port} is not in known_hosts")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Shell channel errors.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Channel closed before the prompt was seen
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),

    /// Escalation to privileged mode did not land on the expected prompt
    #[error("Failed to enter privileged mode, prompt is '{prompt}'")]
    EnableFailed { prompt: String },
}

/// Device type errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// No built-in platform for this device type
    #[error("Unknown device type '{name}'")]
    Unknown { name: String },

    /// Invalid prompt pattern
    #[error("Invalid prompt pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// CDP neighbor output parse errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A neighbor line ran out of tokens before the local interface
    #[error("line {line}: expected local interface type and number in '{content}'")]
    MissingInterface { line: usize, content: String },
}

/// Device inventory errors.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// Inventory file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Inventory is not a JSON array
    #[error("Malformed inventory: {0}")]
    Parse(#[from] serde_json::Error),

    /// An entry is not a valid device object
    #[error("Device #{index}: {source}")]
    Device {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    /// An entry has no network address
    #[error("Device #{index} has no address")]
    MissingAddress { index: usize },
}

/// Run configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Username or password was not supplied
    #[error("Missing credentials: {field} is required")]
    MissingCredentials { field: &'static str },

    /// Change identifier cannot be used in a file name
    #[error("Invalid change identifier '{value}': {reason}")]
    InvalidChangeId { value: String, reason: &'static str },
}

/// Result report errors.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Result could not be serialized
    #[error("Failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Results file could not be written
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type alias using cdp-uplink's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_recoverable() {
        let err: Error = TransportError::Timeout(Duration::from_secs(5)).into();
        assert_eq!(err.session_failure(), Some(SessionFailure::Timeout));
    }

    #[test]
    fn test_unreachable_counts_as_timeout() {
        let err: Error = TransportError::ConnectionFailed {
            host: "10.0.0.1".to_string(),
            port: 22,
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        }
        .into();
        assert_eq!(err.session_failure(), Some(SessionFailure::Timeout));
    }

    #[test]
    fn test_auth_failure_is_recoverable() {
        let err: Error = TransportError::AuthenticationFailed {
            user: "admin".to_string(),
        }
        .into();
        assert_eq!(err.session_failure(), Some(SessionFailure::AuthFailure));
    }

    #[test]
    fn test_parse_and_channel_errors_are_fatal() {
        let err: Error = ParseError::MissingInterface {
            line: 6,
            content: "DeviceB".to_string(),
        }
        .into();
        assert_eq!(err.session_failure(), None);

        let err: Error = ChannelError::Closed.into();
        assert_eq!(err.session_failure(), None);

        let err: Error = TransportError::HostKeyUnknown {
            host: "sw1".to_string(),
            port: 22,
        }
        .into();
        assert_eq!(err.session_failure(), None);

        assert_eq!(Error::Interrupted.session_failure(), None);
    }
}

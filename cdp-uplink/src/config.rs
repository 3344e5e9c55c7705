//! Run configuration: shared credentials, change identifier, output location.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use crate::error::{ConfigError, Result};

/// Username and password shared by every device in a run.
#[derive(Debug)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    /// Create credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// The login name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The login password.
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

/// Change-tracking identifier stamped into device logs and the results file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeId(String);

impl ChangeId {
    /// Validate a change identifier.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let trimmed = value.trim();

        let reason = if trimmed.is_empty() {
            Some("must not be empty")
        } else if trimmed.contains(['/', '\\']) {
            Some("must not contain path separators")
        } else if trimmed.contains("..") {
            Some("must not contain '..'")
        } else if trimmed.contains(|c: char| c.is_control()) {
            Some("must not contain control characters")
        } else if trimmed.contains('"') {
            Some("must not contain quotes")
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(ConfigError::InvalidChangeId { value, reason }.into());
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything a rollout needs besides the inventory and the connector.
#[derive(Debug, Clone)]
pub struct RolloutConfig {
    /// Credentials attached to every device.
    pub credentials: Arc<Credentials>,

    /// Change identifier.
    pub change: ChangeId,

    /// Directory receiving `results-<change>.json`.
    pub results_dir: PathBuf,

    /// Emit `!` after each interface block.
    pub delimiter: bool,
}

impl RolloutConfig {
    /// Start building a configuration for a change.
    pub fn builder(change: impl Into<String>) -> RolloutConfigBuilder {
        RolloutConfigBuilder::new(change)
    }
}

/// Builder for [`RolloutConfig`].
///
/// # Example
///
/// ```rust
/// use cdp_uplink::config::RolloutConfig;
///
/// # fn example() -> Result<(), cdp_uplink::Error> {
/// let config = RolloutConfig::builder("CHG0042")
///     .username("netops")
///     .password("secret")
///     .results_dir("/tmp")
///     .build()?;
/// assert_eq!(config.change.as_str(), "CHG0042");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RolloutConfigBuilder {
    change: String,
    username: Option<String>,
    password: Option<String>,
    results_dir: PathBuf,
    delimiter: bool,
}

impl RolloutConfigBuilder {
    /// Create a builder for the given change identifier.
    pub fn new(change: impl Into<String>) -> Self {
        Self {
            change: change.into(),
            username: None,
            password: None,
            results_dir: PathBuf::from("."),
            delimiter: true,
        }
    }

    /// Set the username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the results directory (default: current directory).
    pub fn results_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.results_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Emit the `!` delimiter line (default: true).
    pub fn delimiter(mut self, delimiter: bool) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<RolloutConfig> {
        let username = self
            .username
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingCredentials { field: "username" })?;
        let password = self
            .password
            .ok_or(ConfigError::MissingCredentials { field: "password" })?;

        Ok(RolloutConfig {
            credentials: Arc::new(Credentials::new(username, password)),
            change: ChangeId::new(self.change)?,
            results_dir: self.results_dir,
            delimiter: self.delimiter,
        })
    }
}

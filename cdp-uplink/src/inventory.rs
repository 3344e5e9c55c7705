//! Device inventory loaded from a JSON file.
//!
//! The inventory is an ordered array of device objects:
//!
//! ```json
//! [
//!   {"device_type": "cisco_ios", "ip": "10.0.0.1"},
//!   {"device_type": "cisco_nxos", "host": "10.0.0.2", "port": 2222, "secret": "enable"}
//! ]
//! ```
//!
//! `host` is accepted in place of `ip`. An entry carrying both uses `ip`,
//! as netmiko does, and the `host` value is ignored.
//!
//! Credentials are never read from the file; they are attached at run time.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, warn};
use serde_json::Value;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

use crate::config::Credentials;
use crate::error::{InventoryError, Result};

/// One device to visit.
#[derive(Debug, Deserialize)]
pub struct DeviceDescriptor {
    /// Network address; identifies the device in results.
    #[serde(alias = "host")]
    pub ip: String,

    /// Driver tag selecting the platform (e.g. `cisco_ios`).
    pub device_type: String,

    /// SSH port override.
    #[serde(default)]
    pub port: Option<u16>,

    /// Enable password.
    #[serde(default, deserialize_with = "deserialize_secret")]
    secret: Option<SecretString>,

    /// Remaining session fields, in file order.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,

    #[serde(skip)]
    credentials: Option<Arc<Credentials>>,
}

impl DeviceDescriptor {
    /// Create a descriptor by hand.
    pub fn new(ip: impl Into<String>, device_type: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            device_type: device_type.into(),
            port: None,
            secret: None,
            extra: IndexMap::new(),
            credentials: None,
        }
    }

    /// Set the enable password.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(SecretString::from(secret.into()));
        self
    }

    /// Set the SSH port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Attach the run's shared credentials.
    pub fn attach_credentials(&mut self, credentials: Arc<Credentials>) {
        self.credentials = Some(credentials);
    }

    /// Credentials attached for this run, if any.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_deref()
    }

    /// Enable password, if the inventory supplied one.
    pub fn secret(&self) -> Option<&str> {
        self.secret.as_ref().map(|s| s.expose_secret())
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

/// Parse an inventory from JSON text.
pub fn from_json(json: &str) -> Result<Vec<DeviceDescriptor>> {
    let entries: Vec<Value> = serde_json::from_str(json).map_err(InventoryError::Parse)?;

    let devices = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| parse_device(index, entry))
        .collect::<Result<Vec<_>>>()?;

    let mut seen = HashSet::new();
    for (index, device) in devices.iter().enumerate() {
        if device.ip.trim().is_empty() {
            return Err(InventoryError::MissingAddress { index }.into());
        }
        if !seen.insert(device.ip.as_str()) {
            warn!("Device {} is listed more than once", device.ip);
        }
    }

    Ok(devices)
}

fn parse_device(index: usize, mut entry: Value) -> Result<DeviceDescriptor> {
    if let Some(fields) = entry.as_object_mut() {
        if fields.contains_key("ip") {
            if let Some(host) = fields.remove("host") {
                debug!("Device #{index}: ignoring host {host} in favour of ip");
            }
        }
    }
    Ok(serde_json::from_value(entry).map_err(|source| InventoryError::Device { index, source })?)
}

/// Load an inventory file.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<DeviceDescriptor>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| InventoryError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    from_json(&json)
}

//! Per device-type CLI behavior.
//!
//! A [`Platform`] knows what the device's prompts look like, how to prepare
//! a session, how to enter and leave configuration mode and how to persist
//! configuration. Platforms are looked up by the inventory's `device_type`.

pub mod cisco;

use regex::bytes::Regex;

use crate::error::{PlatformError, Result};

/// CLI behavior for one device type.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Device type tag (e.g. "cisco_ios").
    pub name: String,

    /// Matches the prompt in any mode.
    pub prompt_pattern: Regex,

    /// Matches the password prompt after `enable`.
    pub enable_password_pattern: Regex,

    /// Commands run once after login.
    pub on_open_commands: Vec<String>,

    /// Command entering configuration mode.
    pub config_enter: String,

    /// Command leaving configuration mode.
    pub config_exit: String,

    /// Command persisting the running configuration.
    pub save_command: String,

    /// Command prefix writing a message to the device log, if supported.
    pub log_command: Option<String>,

    /// Output markers of a rejected command.
    pub failed_when_contains: Vec<String>,
}

impl Platform {
    /// Create a platform with the given prompt pattern.
    pub fn new(name: impl Into<String>, prompt_pattern: &str) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            prompt_pattern: compile(prompt_pattern)?,
            enable_password_pattern: compile(r"(?mi)^password:\s*$")?,
            on_open_commands: vec![],
            config_enter: "configure terminal".to_string(),
            config_exit: "end".to_string(),
            save_command: "write memory".to_string(),
            log_command: None,
            failed_when_contains: vec![],
        })
    }

    /// Look up a built-in platform by device type.
    pub fn for_device_type(device_type: &str) -> Result<Self> {
        match device_type {
            "cisco_ios" | "cisco_xe" | "cisco_ios_ssh" => cisco::ios(device_type),
            "cisco_nxos" | "cisco_nxos_ssh" => cisco::nxos(device_type),
            _ => Err(PlatformError::Unknown {
                name: device_type.to_string(),
            }
            .into()),
        }
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Set the save command.
    pub fn with_save_command(mut self, command: impl Into<String>) -> Self {
        self.save_command = command.into();
        self
    }

    /// Set the log command prefix.
    pub fn with_log_command(mut self, command: impl Into<String>) -> Self {
        self.log_command = Some(command.into());
        self
    }

    /// Add a failure marker.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Whether a prompt belongs to unprivileged (user EXEC) mode.
    pub fn is_unprivileged(&self, prompt: &str) -> bool {
        prompt.trim_end().ends_with('>')
    }

    /// The failure marker found in `output`, if any.
    pub fn detect_failure(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .find(|marker| output.contains(marker.as_str()))
            .map(String::as_str)
    }

    /// The device log command for `message`, if the platform has one.
    ///
    /// Quotes and control characters in `message` become spaces so the
    /// result stays one quoted argument on one line.
    pub fn log_line(&self, message: &str) -> Option<String> {
        let message = message.replace(|c: char| c.is_control() || c == '"', " ");
        self.log_command
            .as_ref()
            .map(|prefix| format!("{prefix} \"{message}\""))
    }

    /// Strip the command echo and the trailing prompt from raw output.
    pub fn normalize_output(&self, raw: &str, command: &str) -> String {
        let output = raw.trim_start_matches('\n');
        let output = match output.split_once('\n') {
            Some((first, rest)) if first.trim_end().ends_with(command) => rest,
            _ => output,
        };

        match output.rfind('\n') {
            Some(pos) => output[..pos].to_string(),
            // Only the prompt is left.
            None if self.prompt_pattern.is_match(output.as_bytes()) => String::new(),
            None => output.to_string(),
        }
    }

    /// The last line of raw output, i.e. the prompt.
    pub fn prompt_of<'a>(&self, raw: &'a str) -> &'a str {
        let start = memchr::memrchr(b'\n', raw.as_bytes()).map_or(0, |pos| pos + 1);
        raw[start..].trim()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Ok(Regex::new(pattern).map_err(PlatformError::InvalidPattern)?)
}

//! Prompt-driven CLI session over any shell channel.

use log::{debug, warn};

use super::DeviceSession;
use crate::channel::{ShellChannel, ShellIo};
use crate::error::{ChannelError, Result};
use crate::platform::Platform;

/// A logged-in CLI on one device, driven by its [`Platform`].
pub struct ShellSession<T> {
    host: String,
    shell: ShellChannel<T>,
    platform: Platform,
    prompt: String,
}

impl<T: ShellIo> ShellSession<T> {
    /// Wrap a freshly opened shell. Call [`ShellSession::prepare`] before use.
    pub fn new(host: impl Into<String>, shell: ShellChannel<T>, platform: Platform) -> Self {
        Self {
            host: host.into(),
            shell,
            platform,
            prompt: String::new(),
        }
    }

    /// The last prompt seen.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The platform driving this session.
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Wait for the login prompt, enter privileged mode, run on_open commands.
    pub async fn prepare(&mut self, secret: Option<&str>) -> Result<()> {
        let banner = self.shell.read_until(&self.platform.prompt_pattern).await?;
        self.prompt = self.platform.prompt_of(&banner).to_string();
        debug!("{}: logged in at '{}'", self.host, self.prompt);

        if self.platform.is_unprivileged(&self.prompt) {
            match secret {
                Some(secret) => self.enable(secret).await?,
                None => warn!("{}: no enable secret, staying at '{}'", self.host, self.prompt),
            }
        }

        for command in self.platform.on_open_commands.clone() {
            self.send_command(&command).await?;
        }
        Ok(())
    }

    async fn enable(&mut self, secret: &str) -> Result<()> {
        self.shell
            .exchange("enable", &self.platform.enable_password_pattern)
            .await?;
        self.shell.send_secret(secret).await?;
        let output = self.shell.read_until(&self.platform.prompt_pattern).await?;
        self.prompt = self.platform.prompt_of(&output).to_string();

        if self.platform.is_unprivileged(&self.prompt) {
            return Err(ChannelError::EnableFailed {
                prompt: self.prompt.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Send one command and return its normalized output.
    async fn send_command(&mut self, command: &str) -> Result<String> {
        let raw = self
            .shell
            .exchange(command, &self.platform.prompt_pattern)
            .await?;
        self.prompt = self.platform.prompt_of(&raw).to_string();

        let output = self.platform.normalize_output(&raw, command);
        debug!("{}: {} -> {} bytes", self.host, command, output.len());
        Ok(output)
    }
}

impl<T: ShellIo> DeviceSession for ShellSession<T> {
    fn host(&self) -> &str {
        &self.host
    }

    async fn run(&mut self, command: &str) -> Result<String> {
        self.send_command(command).await
    }

    async fn configure(&mut self, lines: &[String]) -> Result<String> {
        let mut transcript = Vec::with_capacity(lines.len() + 2);

        let enter = self.platform.config_enter.clone();
        transcript.push(self.send_command(&enter).await?);

        for line in lines {
            let output = self.send_command(line).await?;
            if let Some(marker) = self.platform.detect_failure(&output) {
                warn!("{}: '{}' rejected ({})", self.host, line.trim(), marker);
            }
            transcript.push(output);
        }

        let exit = self.platform.config_exit.clone();
        transcript.push(self.send_command(&exit).await?);

        transcript.retain(|output| !output.is_empty());
        Ok(transcript.join("\n"))
    }

    async fn save(&mut self) -> Result<String> {
        let save = self.platform.save_command.clone();
        self.send_command(&save).await
    }

    async fn log_remote(&mut self, message: &str) -> Result<()> {
        match self.platform.log_line(message) {
            Some(line) => {
                self.send_command(&line).await?;
            }
            None => debug!("{}: no device log command, skipping '{}'", self.host, message),
        }
        Ok(())
    }

    async fn disconnect(self) -> Result<()> {
        self.shell.close().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::Error;
    use crate::channel::testing::{ScriptedShell, WhenIdle};
    use crate::error::TransportError;
    use crate::platform::cisco;

    fn ios_shell(greeting: &str, idle: WhenIdle) -> ScriptedShell {
        ScriptedShell::new(greeting, idle)
            .reply("terminal length 0", "terminal length 0\r\nswitch#")
            .reply("terminal width 511", "terminal width 511\r\nswitch#")
    }

    fn session(io: ScriptedShell, timeout: Duration) -> ShellSession<ScriptedShell> {
        ShellSession::new(
            "10.0.0.1",
            ShellChannel::new(io, timeout),
            cisco::ios("cisco_ios").unwrap(),
        )
    }

    fn lines(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_prepare_enables_with_secret() {
        let io = ios_shell("\r\nswitch>", WhenIdle::Hang)
            .reply("enable", "enable\r\nPassword: ")
            .reply("en4ble", "\r\nswitch#");
        let sent = io.sent();
        let mut session = session(io, Duration::from_secs(5));

        tokio_test::block_on(session.prepare(Some("en4ble"))).unwrap();
        assert_eq!(session.prompt(), "switch#");
        assert_eq!(session.platform().name, "cisco_ios");
        assert_eq!(
            *sent.lock().unwrap(),
            vec!["enable", "en4ble", "terminal length 0", "terminal width 511"]
        );
    }

    #[test]
    fn test_rejected_enable_secret() {
        let io = ios_shell("switch>", WhenIdle::Hang)
            .reply("enable", "enable\r\nPassword: ")
            .reply("wrong", "\r\n% Access denied\r\n\r\nswitch>");
        let mut session = session(io, Duration::from_secs(5));

        let err = tokio_test::block_on(session.prepare(Some("wrong"))).unwrap_err();
        match &err {
            Error::Channel(ChannelError::EnableFailed { prompt }) => assert_eq!(prompt, "switch>"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.session_failure().is_none());
    }

    #[test]
    fn test_prepare_without_secret_stays_unprivileged() {
        let io = ios_shell("switch>", WhenIdle::Hang);
        let sent = io.sent();
        let mut session = session(io, Duration::from_secs(5));

        tokio_test::block_on(session.prepare(None)).unwrap();
        assert!(!sent.lock().unwrap().contains(&"enable".to_string()));
    }

    #[test]
    fn test_configure_warns_but_continues_on_rejected_line() {
        let io = ios_shell("switch#", WhenIdle::Hang)
            .reply(
                "configure terminal",
                "configure terminal\r\nEnter configuration commands, one per line.\r\nswitch(config)#",
            )
            .reply("interface Gig1/0/48", "interface Gig1/0/48\r\nswitch(config-if)#")
            .reply(
                " description UPLINK tocore-sw1",
                " description UPLINK tocore-sw1\r\n        ^\r\n% Invalid input detected at '^' marker.\r\nswitch(config-if)#",
            )
            .reply("!", "!\r\nswitch(config-if)#")
            .reply("end", "end\r\nswitch#");
        let sent = io.sent();
        let mut session = session(io, Duration::from_secs(5));
        tokio_test::block_on(session.prepare(None)).unwrap();

        let transcript = tokio_test::block_on(session.configure(&lines(&[
            "interface Gig1/0/48",
            " description UPLINK tocore-sw1",
            "!",
        ])))
        .unwrap();

        assert!(transcript.starts_with("Enter configuration commands"));
        assert!(transcript.contains("% Invalid input"));
        assert_eq!(session.prompt(), "switch#");
        assert_eq!(
            sent.lock().unwrap()[2..],
            [
                "configure terminal",
                "interface Gig1/0/48",
                " description UPLINK tocore-sw1",
                "!",
                "end",
            ]
        );
    }

    #[test]
    fn test_stalled_command_is_a_timeout() {
        let io = ios_shell("switch#", WhenIdle::Hang).reply(
            "configure terminal",
            "configure terminal\r\nswitch(config)#",
        );
        let mut session = session(io, Duration::from_millis(50));
        tokio_test::block_on(session.prepare(None)).unwrap();

        let err = tokio_test::block_on(session.configure(&lines(&["interface Gig0/1"]))).unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Timeout(_))));
        assert!(err.session_failure().is_some());
    }

    #[test]
    fn test_save_and_log_on_ios() {
        let io = ios_shell("switch#", WhenIdle::Hang)
            .reply(
                "send log 6 \"Starting change CHG1\"",
                "send log 6 \"Starting change CHG1\"\r\nswitch#",
            )
            .reply(
                "write memory",
                "write memory\r\nBuilding configuration...\r\n[OK]\r\nswitch#",
            );
        let sent = io.sent();
        let mut session = session(io, Duration::from_secs(5));
        tokio_test::block_on(session.prepare(None)).unwrap();

        tokio_test::block_on(session.log_remote("Starting change CHG1")).unwrap();
        let saved = tokio_test::block_on(session.save()).unwrap();
        assert_eq!(saved, "Building configuration...\n[OK]");

        tokio_test::block_on(session.disconnect()).unwrap();
        assert_eq!(sent.lock().unwrap().last().map(String::as_str), Some("<close>"));
    }

    #[test]
    fn test_nxos_skips_device_log() {
        let io = ios_shell("nx-sw1#", WhenIdle::Hang).reply(
            "copy running-config startup-config",
            "copy running-config startup-config\r\n[########################################] 100%\r\nCopy complete.\r\nnx-sw1#",
        );
        let sent = io.sent();
        let mut session = ShellSession::new(
            "10.0.0.2",
            ShellChannel::new(io, Duration::from_secs(5)),
            cisco::nxos("cisco_nxos").unwrap(),
        );
        tokio_test::block_on(session.prepare(None)).unwrap();

        tokio_test::block_on(session.log_remote("Starting change CHG1")).unwrap();
        tokio_test::block_on(session.save()).unwrap();

        let sent = sent.lock().unwrap();
        assert!(!sent.iter().any(|line| line.starts_with("send log")));
        assert_eq!(sent.last().map(String::as_str), Some("copy running-config startup-config"));
    }
}

//! Device rollout: describe uplinks on every device in the inventory.
//!
//! Devices are visited one at a time, in inventory order. A device that
//! times out or rejects the credentials is recorded as failed and the run
//! moves on; any other error ends the run.
//!
//! A run can be interrupted through [`Rollout::with_cancel`]. The device in
//! progress is still disconnected and the run ends with [`Error::Interrupted`].
//!
//! # Example
//!
//! ```rust,no_run
//! use cdp_uplink::config::RolloutConfig;
//! use cdp_uplink::rollout::Rollout;
//! use cdp_uplink::session::SshConnector;
//!
//! # async fn example() -> Result<(), cdp_uplink::Error> {
//! let config = RolloutConfig::builder("CHG0042")
//!     .username("netops")
//!     .password("secret")
//!     .build()?;
//! let devices = cdp_uplink::inventory::load("devices.json")?;
//!
//! let rollout = Rollout::new(SshConnector::default(), config);
//! let results = rollout.execute(devices, &mut ()).await?;
//! println!("results in {}", results.display());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use log::{debug, error, info, warn};
use tokio::sync::watch;

use crate::cdp::{SHOW_CDP_NEIGHBORS, UplinkConfig};
use crate::config::RolloutConfig;
use crate::error::{Error, Result};
use crate::inventory::DeviceDescriptor;
use crate::report::{self, RunResult};
use crate::session::{Connector, DeviceSession};

/// Observer for user-facing progress.
///
/// All hooks default to doing nothing; `()` is the silent observer.
pub trait Progress {
    /// About to connect to the `position`-th (0-based) of `total` devices.
    fn connecting(&mut self, _device: &DeviceDescriptor, _position: usize, _total: usize) {}

    /// Configuration derived for a device.
    fn derived(&mut self, _host: &str, _lines: &[String]) {}

    /// Device configured and saved.
    fn succeeded(&mut self, _host: &str) {}

    /// Device skipped after a session failure.
    fn failed(&mut self, _host: &str, _error: &Error) {}
}

impl Progress for () {}

/// Sequential uplink-description rollout over a connector.
pub struct Rollout<C> {
    connector: C,
    config: RolloutConfig,
    uplinks: UplinkConfig,
    cancel: Option<watch::Receiver<bool>>,
}

impl<C: Connector> Rollout<C> {
    /// Create a rollout.
    pub fn new(connector: C, config: RolloutConfig) -> Self {
        let uplinks = UplinkConfig::new().delimiter(config.delimiter);
        Self {
            connector,
            config,
            uplinks,
            cancel: None,
        }
    }

    /// Stop the run once `cancel` turns true.
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once cancellation is requested; never without a signal.
    async fn cancelled(&self) {
        if let Some(rx) = &self.cancel {
            let mut rx = rx.clone();
            if rx.wait_for(|cancelled| *cancelled).await.is_ok() {
                return;
            }
        }
        std::future::pending::<()>().await
    }

    /// Visit every device in order and collect per-device outcomes.
    ///
    /// Returns early with the first error that is not a session failure;
    /// devices after it are not visited.
    pub async fn run(
        &self,
        devices: Vec<DeviceDescriptor>,
        progress: &mut impl Progress,
    ) -> Result<RunResult> {
        let mut result = RunResult::new();
        let total = devices.len();
        info!("Change {}: {} device(s)", self.config.change, total);

        for (position, mut device) in devices.into_iter().enumerate() {
            if self.is_cancelled() {
                warn!("Change {}: interrupted before {}", self.config.change, device.ip);
                return Err(Error::Interrupted);
            }
            device.attach_credentials(self.config.credentials.clone());
            progress.connecting(&device, position, total);

            match self.visit(&device, progress).await {
                Ok(()) => {
                    info!("{}: uplink descriptions saved", device.ip);
                    progress.succeeded(&device.ip);
                    result.record_success(device.ip.as_str());
                }
                Err(e) => match e.session_failure() {
                    Some(kind) => {
                        warn!("{}: skipped after {}: {}", device.ip, kind, e);
                        progress.failed(&device.ip, &e);
                        result.record_failure(&device.ip, &e);
                    }
                    None if matches!(e, Error::Interrupted) => {
                        warn!("{}: interrupted", device.ip);
                        return Err(e);
                    }
                    None => {
                        error!("{}: aborting run: {}", device.ip, e);
                        return Err(e);
                    }
                },
            }
        }

        Ok(result)
    }

    /// Run, then print and write the results file.
    pub async fn execute(
        &self,
        devices: Vec<DeviceDescriptor>,
        progress: &mut impl Progress,
    ) -> Result<PathBuf> {
        let result = self.run(devices, progress).await?;
        report::publish(&result, &self.config.change, &self.config.results_dir)
    }

    /// One device: connect, apply, and always disconnect once connected.
    async fn visit(&self, device: &DeviceDescriptor, progress: &mut impl Progress) -> Result<()> {
        let mut session = tokio::select! {
            session = self.connector.connect(device) => session?,
            _ = self.cancelled() => return Err(Error::Interrupted),
        };
        let applied = tokio::select! {
            applied = self.apply(&mut session, progress) => applied,
            _ = self.cancelled() => Err(Error::Interrupted),
        };
        let closed = session.disconnect().await;

        match applied {
            Ok(()) => closed,
            Err(e) => {
                if let Err(close_err) = closed {
                    warn!("{}: disconnect after failure also failed: {}", device.ip, close_err);
                }
                Err(e)
            }
        }
    }

    async fn apply<S: DeviceSession>(
        &self,
        session: &mut S,
        progress: &mut impl Progress,
    ) -> Result<()> {
        let change = &self.config.change;
        session.log_remote(&format!("Starting change {change}")).await?;

        let neighbors = session.run(SHOW_CDP_NEIGHBORS).await?;
        let lines = self.uplinks.derive(&neighbors)?;
        debug!("{}: {} configuration line(s)", session.host(), lines.len());
        progress.derived(session.host(), &lines);

        let transcript = session.configure(&lines).await?;
        debug!("{}: configuration transcript:\n{}", session.host(), transcript);
        session.save().await?;

        session.log_remote(&format!("Completed change {change}")).await?;
        Ok(())
    }
}

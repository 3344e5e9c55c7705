//! Run results: which devices were configured and which failed.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;

use crate::config::ChangeId;
use crate::error::{ReportError, Result};

/// Per-device outcome of a rollout, in encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunResult {
    /// Addresses of devices that were configured and saved.
    #[serde(rename = "Successful")]
    pub successful: Vec<String>,

    /// `"<address>: <error>"` for devices that were skipped.
    #[serde(rename = "Failed")]
    pub failed: Vec<String>,
}

impl RunResult {
    /// Create an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a configured device.
    pub fn record_success(&mut self, address: impl Into<String>) {
        self.successful.push(address.into());
    }

    /// Record a failed device.
    pub fn record_failure(&mut self, address: &str, error: impl Display) {
        self.failed.push(format!("{address}: {error}"));
    }

    /// Number of devices visited.
    pub fn len(&self) -> usize {
        self.successful.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pretty JSON with two-space indentation.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self).map_err(ReportError::Serialize)?)
    }
}

/// Path of the results file for a change.
pub fn results_path(dir: impl AsRef<Path>, change: &ChangeId) -> PathBuf {
    dir.as_ref().join(format!("results-{change}.json"))
}

/// Print the result to stdout and write it to `results-<change>.json`.
pub fn publish(result: &RunResult, change: &ChangeId, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let json = result.to_json()?;
    println!("{json}");

    let path = results_path(dir, change);
    std::fs::write(&path, format!("{json}\n")).map_err(|source| ReportError::Write {
        path: path.clone(),
        source,
    })?;
    if result.is_empty() {
        warn!("No devices were visited");
    }
    info!("Results for {} device(s) written to {}", result.len(), path.display());
    Ok(path)
}

//! Command-line entry point.
//!
//! ```bash
//! cdp-uplink devices.json
//! CDP_UPLINK_USERNAME=netops cdp-uplink --change CHG0042 --host-key strict devices.json
//! ```
//!
//! Anything not given as a flag or environment variable (username, password,
//! change number) is prompted for once before the first device is contacted.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use console::Term;
use log::warn;
use tokio::sync::watch;

use cdp_uplink::{
    DeviceDescriptor, Error, HostKeyVerification, Progress, Rollout, RolloutConfig, SshConfig,
    SshConnector, inventory,
};

#[derive(Parser)]
#[command(name = "cdp-uplink", version)]
#[command(about = "Describe switch uplinks from their CDP neighbor tables.")]
struct CommandLine {
    /// JSON inventory of devices
    inventory: Option<PathBuf>,

    /// Login name for every device
    #[arg(short, long, env = "CDP_UPLINK_USERNAME")]
    username: Option<String>,

    /// Login password for every device
    #[arg(long, env = "CDP_UPLINK_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Approved change number
    #[arg(short, long, env = "CDP_UPLINK_CHANGE")]
    change: Option<String>,

    /// Default SSH port
    #[arg(long, default_value_t = 22)]
    port: u16,

    /// Connect and command timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Directory for the results file
    #[arg(long, default_value = ".")]
    results_dir: PathBuf,

    /// Host key checking
    #[arg(long, value_enum, default_value_t = HostKeyMode::AcceptNew)]
    host_key: HostKeyMode,

    /// Do not emit `!` after each interface block
    #[arg(long)]
    no_delimiter: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum HostKeyMode {
    Strict,
    AcceptNew,
    Disabled,
}

impl From<HostKeyMode> for HostKeyVerification {
    fn from(mode: HostKeyMode) -> Self {
        match mode {
            HostKeyMode::Strict => HostKeyVerification::Strict,
            HostKeyMode::AcceptNew => HostKeyVerification::AcceptNew,
            HostKeyMode::Disabled => HostKeyVerification::Disabled,
        }
    }
}

/// Prints progress the way an operator watches a change window.
struct ConsoleProgress;

impl Progress for ConsoleProgress {
    fn connecting(&mut self, device: &DeviceDescriptor, _position: usize, _total: usize) {
        println!("{}", "~".repeat(79));
        println!("Connecting to device: {}", device.ip);
        println!();
    }

    fn derived(&mut self, _host: &str, lines: &[String]) {
        println!("{}", lines.join("\n"));
    }

    fn failed(&mut self, host: &str, error: &Error) {
        println!("Failed to  {} {}", host, error);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CommandLine::parse();

    let Some(inventory_path) = args.inventory.clone() else {
        println!("Usage: cdp-uplink devices.json");
        return Ok(ExitCode::SUCCESS);
    };

    let term = Term::stderr();
    let change = match args.change.clone() {
        Some(change) => change,
        None => prompt(&term, "Please enter an approved change number: ", false)?,
    };
    let username = match args.username.clone() {
        Some(username) => username,
        None => prompt(&term, "Username: ", false)?,
    };
    let password = match args.password.clone() {
        Some(password) => password,
        None => prompt(&term, "Password: ", true)?,
    };

    let config = RolloutConfig::builder(change)
        .username(username)
        .password(password)
        .results_dir(&args.results_dir)
        .delimiter(!args.no_delimiter)
        .build()?;

    let devices = inventory::load(&inventory_path)
        .with_context(|| format!("loading inventory {}", inventory_path.display()))?;

    let ssh = SshConfig::default()
        .with_port(args.port)
        .with_timeout(Duration::from_secs(args.timeout))
        .with_host_key_verification(args.host_key.into());

    let (cancel, cancelled) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, closing the current session");
            cancel.send_replace(true);
        }
    });

    let rollout = Rollout::new(SshConnector::new(ssh), config).with_cancel(cancelled);
    let mut progress = ConsoleProgress;
    match rollout.execute(devices, &mut progress).await {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(Error::Interrupted) => {
            warn!("No results written");
            Ok(ExitCode::from(130))
        }
        Err(e) => Err(e.into()),
    }
}

fn prompt(term: &Term, label: &str, secret: bool) -> anyhow::Result<String> {
    term.write_str(label)?;
    if secret {
        Ok(term.read_secure_line()?)
    } else {
        Ok(term.read_line()?.trim().to_string())
    }
}

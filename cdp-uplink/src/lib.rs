//! # cdp-uplink
//!
//! Describe switch uplinks from their CDP neighbor tables.
//!
//! For every device in an inventory, cdp-uplink logs in over SSH, reads
//! `show cdp neighbors`, derives an `interface` / `description UPLINK to<neighbor>`
//! block for each neighbor, applies it, saves the configuration and records
//! whether the device succeeded or failed.
//!
//! ## Features
//!
//! - Parser for wrapped and single-line CDP neighbor rows
//! - Sequential rollout with per-device failure isolation
//! - Async SSH sessions via russh with tail-only prompt matching
//! - Cisco IOS, IOS-XE and NX-OS platforms
//!
//! ## Quick Start
//!
//! ```rust
//! let output = "\
//! Capability Codes: R - Router, T - Trans Bridge, B - Source Route Bridge
//!                   S - Switch, H - Host, I - IGMP, r - Repeater, P - Phone,
//!                   D - Remote, C - CVTA, M - Two-port Mac Relay
//!
//! Device ID        Local Intrfce     Holdtme    Capability  Platform  Port ID
//! DeviceB          Gig 0/1           157            R S I   WS-C3750  Gig 1/0/24
//! ";
//!
//! let config = cdp_uplink::cdp::uplink_config(output)?;
//! assert_eq!(config, ["interface Gig0/1", " description UPLINK toDeviceB", "!"]);
//! # Ok::<(), cdp_uplink::error::ParseError>(())
//! ```

pub mod cdp;
pub mod channel;
pub mod config;
pub mod error;
pub mod inventory;
pub mod platform;
pub mod report;
pub mod rollout;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use cdp::{Neighbor, UplinkConfig};
pub use config::{ChangeId, Credentials, RolloutConfig};
pub use error::{Error, Result, SessionFailure};
pub use inventory::DeviceDescriptor;
pub use report::RunResult;
pub use rollout::{Progress, Rollout};
pub use session::{Connector, DeviceSession, SshConnector};
pub use transport::{HostKeyVerification, SshConfig};

//! SSH transport layer wrapping russh.
//!
//! Connection setup, authentication, host key checks and the interactive
//! shell channel every device session runs on.

pub mod config;
mod ssh;

pub use config::{HostKeyVerification, SshConfig, Target};
pub use ssh::SshTransport;

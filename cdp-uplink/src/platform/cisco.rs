//! Cisco IOS, IOS-XE and NX-OS platforms.
//!
//! # Prompt Examples
//!
//! ```text
//! switch>                            # user EXEC
//! switch#                            # privileged EXEC
//! switch(config)#                    # configuration mode
//! switch(config-if)#                 # interface sub-mode
//! ```

use super::Platform;
use crate::error::Result;

const PROMPT: &str = r"(?m)^[\w.\-@/:]{1,63}(?:\([\w.\-@/:+]{0,63}\))?[>#]\s*$";

/// IOS and IOS-XE switches.
pub fn ios(name: &str) -> Result<Platform> {
    Ok(Platform::new(name, PROMPT)?
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 511")
        .with_log_command("send log 6")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("% Unknown command"))
}

/// NX-OS switches. NX-OS has no `send log`, so nothing is written to the
/// device log.
pub fn nxos(name: &str) -> Result<Platform> {
    Ok(Platform::new(name, PROMPT)?
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 511")
        .with_save_command("copy running-config startup-config")
        .with_failure_pattern("% Invalid command")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Invalid parameter"))
}

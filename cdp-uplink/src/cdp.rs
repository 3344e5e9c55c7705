//! Uplink descriptions derived from `show cdp neighbors` output.
//!
//! The neighbor table is fixed-width CLI text. Each neighbor is either one
//! line (device ID, local interface, ...) or, when the device ID is too long
//! for its column, the device ID alone on a line followed by the rest of the
//! record on the next line:
//!
//! ```text
//! Device ID        Local Intrfce     Holdtme    Capability  Platform  Port ID
//! core-sw1.example.com
//!                  Gig 1/0/48        164             R S I  WS-C3850- Gig 1/0/1
//! dist-sw2         Gig 1/0/47        133             R S I  WS-C3850- Gig 1/0/2
//! ```
//!
//! Every neighbor becomes an `interface` / `description` / `!` block.

use log::trace;

use crate::error::ParseError;

/// Lines of banner and column headers preceding the neighbor rows.
pub const HEADER_LINES: usize = 5;

/// Command whose output is parsed here.
pub const SHOW_CDP_NEIGHBORS: &str = "show cdp neighbors";

const SUMMARY_PREFIX: &str = "Total cdp entries displayed";

/// A local interface and the neighbor seen on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighbor {
    /// Local interface, type and number joined (`Gig0/1`).
    pub local_interface: String,

    /// Neighbor device ID without its domain.
    pub hostname: String,
}

impl Neighbor {
    /// Configuration lines describing this uplink.
    pub fn config_lines(&self, delimiter: bool) -> Vec<String> {
        let mut lines = vec![
            format!("interface {}", self.local_interface),
            format!(" description UPLINK to{}", self.hostname),
        ];
        if delimiter {
            lines.push("!".to_string());
        }
        lines
    }
}

/// Options for turning neighbor output into configuration.
#[derive(Debug, Clone)]
pub struct UplinkConfig {
    header_lines: usize,
    delimiter: bool,
}

impl Default for UplinkConfig {
    fn default() -> Self {
        Self {
            header_lines: HEADER_LINES,
            delimiter: true,
        }
    }
}

impl UplinkConfig {
    /// Create options with the IOS defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how many leading lines are skipped unconditionally.
    pub fn header_lines(mut self, lines: usize) -> Self {
        self.header_lines = lines;
        self
    }

    /// Emit the `!` line after each interface block (default: true).
    pub fn delimiter(mut self, delimiter: bool) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parse the neighbor rows in table order.
    pub fn neighbors(&self, output: &str) -> Result<Vec<Neighbor>, ParseError> {
        let mut neighbors = Vec::new();
        let mut pending_hostname: Option<String> = None;

        for (index, line) in output.lines().enumerate().skip(self.header_lines) {
            if line.trim_start().starts_with(SUMMARY_PREFIX) {
                break;
            }

            let mut words: Vec<&str> = line.split_whitespace().collect();
            match words.len() {
                0 => continue,
                1 => {
                    pending_hostname = Some(short_hostname(words[0]));
                    continue;
                }
                _ => {}
            }

            let hostname = match pending_hostname.take() {
                Some(hostname) => hostname,
                None => short_hostname(words.remove(0)),
            };

            if words.len() < 2 {
                return Err(ParseError::MissingInterface {
                    line: index + 1,
                    content: line.to_string(),
                });
            }

            let neighbor = Neighbor {
                local_interface: format!("{}{}", words[0], words[1]),
                hostname,
            };
            trace!("{} -> {}", neighbor.local_interface, neighbor.hostname);
            neighbors.push(neighbor);
        }

        Ok(neighbors)
    }

    /// Derive the configuration lines for every neighbor.
    pub fn derive(&self, output: &str) -> Result<Vec<String>, ParseError> {
        Ok(self
            .neighbors(output)?
            .iter()
            .flat_map(|n| n.config_lines(self.delimiter))
            .collect())
    }
}

/// Parse neighbor rows with the default options.
pub fn parse_neighbors(output: &str) -> Result<Vec<Neighbor>, ParseError> {
    UplinkConfig::default().neighbors(output)
}

/// Derive uplink description configuration with the default options.
pub fn uplink_config(output: &str) -> Result<Vec<String>, ParseError> {
    UplinkConfig::default().derive(output)
}

fn short_hostname(device_id: &str) -> String {
    device_id.split('.').next().unwrap_or(device_id).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "\
Capability Codes: R - Router, T - Trans Bridge, B - Source Route Bridge
                  S - Switch, H - Host, I - IGMP, r - Repeater, P - Phone,
                  D - Remote, C - CVTA, M - Two-port Mac Relay

Device ID        Local Intrfce     Holdtme    Capability  Platform  Port ID
";

    fn with_header(rows: &str) -> String {
        format!("{HEADER}{rows}")
    }

    #[test]
    fn test_single_line_neighbor() {
        let output = with_header("DeviceB       Gig 0/1   157   R S I   WS-C3750  Gig 1/0/24\n");
        assert_eq!(
            uplink_config(&output).unwrap(),
            vec!["interface Gig0/1", " description UPLINK toDeviceB", "!"]
        );
    }

    #[test]
    fn test_wrapped_hostname_strips_domain() {
        let output = with_header(
            "switch-core.example.com\n                 Gig 0/2   120   R S I  WS-C4500X  Ten 1/1/1\n",
        );
        let neighbors = parse_neighbors(&output).unwrap();
        assert_eq!(
            neighbors,
            vec![Neighbor {
                local_interface: "Gig0/2".to_string(),
                hostname: "switch-core".to_string(),
            }]
        );
    }

    #[test]
    fn test_mixed_rows_keep_table_order() {
        let output = with_header(
            "\
core-sw1.example.com
                 Gig 1/0/48        164             R S I  WS-C3850- Gig 1/0/1
dist-sw2.lab     Gig 1/0/47        133             R S I  WS-C3850- Gig 1/0/2
",
        );
        assert_eq!(
            uplink_config(&output).unwrap(),
            vec![
                "interface Gig1/0/48",
                " description UPLINK tocore-sw1",
                "!",
                "interface Gig1/0/47",
                " description UPLINK todist-sw2",
                "!",
            ]
        );
    }

    #[test]
    fn test_hostname_is_not_reused() {
        // The wrapped name belongs to the first interface line only; the
        // second line starts with its own device ID.
        let output = with_header(
            "\
edge-a
                 Fas 0/1           140              S I   WS-C2960  Fas 0/24
edge-b           Fas 0/2           140              S I   WS-C2960  Fas 0/23
",
        );
        let neighbors = parse_neighbors(&output).unwrap();
        assert_eq!(neighbors[0].hostname, "edge-a");
        assert_eq!(neighbors[1].hostname, "edge-b");
        assert_eq!(neighbors[1].local_interface, "Fas0/2");
    }

    #[test]
    fn test_dangling_hostname_is_dropped() {
        let output = with_header(
            "DeviceB       Gig 0/1   157   R S I   WS-C3750  Gig 1/0/24\nlonely.example.com\n",
        );
        assert_eq!(uplink_config(&output).unwrap().len(), 3);
    }

    #[test]
    fn test_header_only_yields_nothing() {
        assert!(uplink_config(HEADER).unwrap().is_empty());
        assert!(uplink_config("").unwrap().is_empty());
    }

    #[test]
    fn test_header_is_skipped_unconditionally() {
        // Even neighbor-looking rows inside the first five lines are ignored.
        let output = "a b c\nd e f\ng h i\nj k l\nm n o\nsw9 Gig 0/9 10 S C9300 Gig 1\n";
        assert_eq!(
            parse_neighbors(output).unwrap(),
            vec![Neighbor {
                local_interface: "Gig0/9".to_string(),
                hostname: "sw9".to_string(),
            }]
        );
    }

    #[test]
    fn test_summary_trailer_and_blank_lines() {
        let output = with_header(
            "DeviceB       Gig 0/1   157   R S I   WS-C3750  Gig 1/0/24\n\nTotal cdp entries displayed : 1\n",
        );
        assert_eq!(uplink_config(&output).unwrap().len(), 3);
    }

    #[test]
    fn test_missing_interface_fails_fast() {
        let output = with_header("DeviceB  Gig\n");
        let err = uplink_config(&output).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingInterface {
                line: 6,
                content: "DeviceB  Gig".to_string(),
            }
        );
    }

    #[test]
    fn test_without_delimiter() {
        let output = with_header("DeviceB       Gig 0/1   157   R S I   WS-C3750  Gig 1/0/24\n");
        let lines = UplinkConfig::new().delimiter(false).derive(&output).unwrap();
        assert_eq!(lines, vec!["interface Gig0/1", " description UPLINK toDeviceB"]);
    }

    #[test]
    fn test_custom_header_length() {
        let output = "Device ID   Local Intrfce   Holdtme   Capability  Platform  Port ID\n\
                      DeviceB     Gig 0/1         157       R S I       WS-C3750  Gig 1/0/24\n";
        let lines = UplinkConfig::new().header_lines(1).derive(output).unwrap();
        assert_eq!(lines, vec!["interface Gig0/1", " description UPLINK toDeviceB", "!"]);
    }

    #[test]
    fn test_derive_is_repeatable() {
        let output = with_header(
            "core-sw1.example.com\n   Gig 1/0/48  164  R S I  WS-C3850- Gig 1/0/1\nsw2 Te 1/1/1 99 S C9500 Te 2/0/1\n",
        );
        let first = uplink_config(&output).unwrap();
        let second = uplink_config(&output).unwrap();
        assert_eq!(first, second);
    }
}

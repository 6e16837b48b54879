//! Terminal output utilities.
//!
//! Provides formatting helpers for terminal output.

use crate::processing::SubnetInfo;
use colored::Colorize;

/// Format a value as a quoted, right-aligned field.
///
/// # Arguments
/// * `value` - The value to format
/// * `width` - The minimum width of the field
///
/// # Returns
/// A quoted, right-aligned string
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let value_str = value.to_string();
    let quoted = format!("\"{value_str}\"");
    let quoted_len = quoted.len();

    if quoted_len >= width {
        quoted
    } else {
        format!("{quoted:>width$}")
    }
}

/// Label/value lines of a subnet report.
///
/// The reserved addresses follow the `Reserved addresses:` line one per line.
pub fn subnet_info_lines(info: &SubnetInfo) -> Vec<(String, String)> {
    let mut lines = vec![
        ("Subnet:".to_string(), info.subnet.clone()),
        (
            "Entity ID:".to_string(),
            info.entity_id.map(|id| id.to_string()).unwrap_or_default(),
        ),
        ("Netmask:".to_string(), info.netmask.clone()),
        ("Description:".to_string(), format!("'{}'", info.description)),
        ("Name-prefix:".to_string(), format!("'{}'", info.name_prefix)),
        ("VLAN:".to_string(), info.vlan_number.clone()),
        (
            "DNS-delegated:".to_string(),
            if info.dns_delegated { "yes" } else { "no" }.to_string(),
        ),
        ("IP-range:".to_string(), info.ip_range.clone()),
        ("Reserved host addresses:".to_string(), info.reserved_count.to_string()),
    ];
    let mut reserved = info.reserved_addresses.iter();
    lines.push((
        "Reserved addresses:".to_string(),
        reserved.next().cloned().unwrap_or_default(),
    ));
    lines.extend(reserved.map(|addr| (String::new(), addr.clone())));
    lines.push(("Used addresses:".to_string(), info.used.to_string()));
    lines.push(("Unused addresses:".to_string(), info.unused.to_string()));
    lines
}

/// Print a subnet report to stdout.
pub fn print_subnet_info(info: &SubnetInfo) {
    for (label, value) in subnet_info_lines(info) {
        let value = match label.as_str() {
            "DNS-delegated:" if info.dns_delegated => value.yellow().to_string(),
            "Unused addresses:" if info.unused == 0 => value.red().to_string(),
            _ => value,
        };
        println!("{:<26}{}", label.bold(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AllocatedAddresses, Subnet};

    #[test]
    fn test_format_field_short() {
        assert_eq!(format_field("test", 10), "    \"test\"");
    }

    #[test]
    fn test_format_field_exact() {
        assert_eq!(format_field("test", 6), "\"test\"");
    }

    #[test]
    fn test_format_field_long() {
        assert_eq!(format_field("long_value", 5), "\"long_value\"");
    }

    #[test]
    fn test_format_field_number() {
        assert_eq!(format_field(42, 6), "  \"42\"");
    }

    #[test]
    fn test_subnet_info_lines() {
        let subnet = Subnet::create_with_reserved("10.0.0.0/30", "p2p", 0).unwrap();
        let info = SubnetInfo::build(&subnet, &AllocatedAddresses::new());
        let lines = subnet_info_lines(&info);

        assert_eq!(lines[0], ("Subnet:".to_string(), "10.0.0.0/30".to_string()));
        let reserved_at = lines
            .iter()
            .position(|(label, _)| label == "Reserved addresses:")
            .unwrap();
        assert_eq!(lines[reserved_at].1, "10.0.0.0 (net)");
        assert_eq!(
            lines[reserved_at + 1],
            (String::new(), "10.0.0.3 (broadcast)".to_string())
        );
        assert_eq!(
            lines.last().unwrap(),
            &("Unused addresses:".to_string(), "2".to_string())
        );
    }
}

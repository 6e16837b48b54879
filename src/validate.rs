//! Address and subnet string validation.
//!
//! These checks are independent of any stored subnet. Leading zeros in IPv4
//! octets are always rejected (`10.0.0.01` is not an address here), DNS
//! tooling further down the line depends on that.

use crate::error::{Result, SubnetError};
use crate::models::Family;
use regex::Regex;
use std::net::Ipv6Addr;
use std::str::FromStr;
use std::sync::OnceLock;

static OCTET_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_octet_regex() -> &'static Regex {
    OCTET_REGEX.get_or_init(|| Regex::new(r"^[0-9]{1,3}$").expect("Invalid Regex"))
}

/// Check segment count and segment range of an address.
///
/// IPv4 accepts 1 to 4 octets, since partial addresses are used as subnet
/// shorthand (`129.240.2` for `129.240.2.0`).
pub fn is_well_formed(address: &str, family: Family) -> bool {
    match family {
        Family::V4 => {
            let octets: Vec<&str> = address.split('.').collect();
            (1..=4).contains(&octets.len())
                && octets.iter().all(|o| {
                    get_octet_regex().is_match(o) && o.parse::<u16>().map_or(false, |v| v <= 255)
                })
        }
        Family::V6 => is_valid_ipv6(address),
    }
}

/// True if `address` parses as an IPv6 address.
pub fn is_valid_ipv6(address: &str) -> bool {
    Ipv6Addr::from_str(address).is_ok()
}

/// Fail if any IPv4 octet has a leading zero.
pub fn reject_leading_zeros(address: &str) -> Result<()> {
    for octet in address.split('.') {
        if octet.len() > 1 && octet.starts_with('0') {
            return Err(SubnetError::format(
                address,
                format!("leading zero in octet '{octet}'"),
            ));
        }
    }
    Ok(())
}

/// Expand an IPv6 address to 8 zero-padded hextets.
///
/// # Examples
/// ```
/// use dns_subnet_allocator::validate::explode;
/// assert_eq!(
///     explode("2001:db8::1").unwrap(),
///     "2001:0db8:0000:0000:0000:0000:0000:0001"
/// );
/// ```
pub fn explode(address: &str) -> Result<String> {
    let addr = Ipv6Addr::from_str(address.trim())
        .map_err(|e| SubnetError::format(address, e.to_string()))?;
    Ok(explode_segments(&addr.segments()))
}

pub(crate) fn explode_segments(segments: &[u16; 8]) -> String {
    segments
        .iter()
        .map(|s| format!("{s:04x}"))
        .collect::<Vec<String>>()
        .join(":")
}

/// Validate a subnet specification such as `10.0.0.0/16` or `2001:db8::/64`.
///
/// An IPv4 subnet may leave out the last octet (`10.0.0/16`).
pub fn validate_subnet(subnet: &str, family: Family) -> Result<()> {
    let subnet = subnet.trim();
    let (ip, mask) = subnet
        .split_once('/')
        .ok_or_else(|| SubnetError::format(subnet, "Not a valid subnet"))?;
    let mask: u8 = mask
        .parse()
        .map_err(|_| SubnetError::format(subnet, "Not a valid subnet"))?;

    match family {
        Family::V4 => {
            let segments = ip.split('.').count();
            if segments != 3 && segments != 4 {
                return Err(SubnetError::format(
                    subnet,
                    format!("Invalid number of segments in '{ip}'. Should be 3 or 4"),
                ));
            }
            if !is_well_formed(ip, Family::V4) {
                return Err(SubnetError::format(
                    subnet,
                    format!("Element out of range in '{ip}'"),
                ));
            }
            reject_leading_zeros(ip)?;
        }
        Family::V6 => {
            if !is_valid_ipv6(ip) {
                return Err(SubnetError::format(subnet, format!("Invalid address: {ip}")));
            }
        }
    }

    if mask > family.width() {
        return Err(SubnetError::format(
            subnet,
            format!(
                "Invalid subnet mask '{mask}'; outside range 0-{}",
                family.width()
            ),
        ));
    }
    Ok(())
}

/// Non-failing check that `cidr` is a valid IPv4 or IPv6 subnet.
pub fn validate_cidr(cidr: &str) -> bool {
    let ip = cidr.split('/').next().unwrap_or_default();
    validate_subnet(cidr, Family::of(ip)).is_ok()
}

//! Address and CIDR arithmetic for IPv4 and IPv6.
//!
//! Addresses are handled as `u128` in both families so the subnet and finder
//! code can share one implementation. IPv4 values only use the low 32 bits.

use crate::error::{Result, SubnetError};
use crate::validate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Maximum prefix length for an IPv4 subnet.
pub const MAX_LENGTH_V4: u8 = 32;
/// Maximum prefix length for an IPv6 subnet.
pub const MAX_LENGTH_V6: u8 = 128;

/// Address family of an address or subnet.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    V4,
    V6,
}

impl Family {
    /// Number of bits in an address of this family.
    pub fn width(self) -> u8 {
        match self {
            Family::V4 => MAX_LENGTH_V4,
            Family::V6 => MAX_LENGTH_V6,
        }
    }

    /// All bits of the family set, as `u128`.
    pub fn all_bits(self) -> u128 {
        match self {
            Family::V4 => u32::MAX as u128,
            Family::V6 => u128::MAX,
        }
    }

    /// Guess the family from an address string: a colon means IPv6.
    pub fn of(address: &str) -> Family {
        if address.contains(':') {
            Family::V6
        } else {
            Family::V4
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::V4 => write!(f, "IPv4"),
            Family::V6 => write!(f, "IPv6"),
        }
    }
}

/// Parse an address string into its integer form, detecting the family.
///
/// # Examples
/// ```
/// use dns_subnet_allocator::models::address_to_integer;
/// assert_eq!(address_to_integer("10.0.0.1").unwrap(), 167772161);
/// assert!(address_to_integer("10.0.0.01").is_err());
/// ```
pub fn address_to_integer(address: &str) -> Result<u128> {
    address_to_integer_for(address, Family::of(address))
}

/// Parse an address string of a known family into its integer form.
pub fn address_to_integer_for(address: &str, family: Family) -> Result<u128> {
    let address = address.trim();
    match family {
        Family::V4 => {
            validate::reject_leading_zeros(address)?;
            if address.split('.').count() != 4 {
                return Err(SubnetError::format(address, "IPv4 address needs 4 octets"));
            }
            let addr = Ipv4Addr::from_str(address)
                .map_err(|e| SubnetError::format(address, e.to_string()))?;
            Ok(u32::from(addr) as u128)
        }
        Family::V6 => {
            let addr = Ipv6Addr::from_str(address)
                .map_err(|e| SubnetError::format(address, e.to_string()))?;
            Ok(u128::from(addr))
        }
    }
}

/// Format an integer as the canonical address string of `family`.
///
/// IPv6 addresses come out exploded, e.g. `2001:0db8:0000:...`. Values wider
/// than the family are truncated to the family width.
pub fn integer_to_address(value: u128, family: Family) -> String {
    match family {
        Family::V4 => Ipv4Addr::from((value & Family::V4.all_bits()) as u32).to_string(),
        Family::V6 => validate::explode_segments(&Ipv6Addr::from(value).segments()),
    }
}

/// Convert a prefix length to a netmask, `2^width - 2^(width - prefix)`.
pub fn netmask_bits_to_integer(prefix: u8, family: Family) -> Result<u128> {
    let width = family.width();
    if prefix > width {
        return Err(SubnetError::format(
            &format!("/{prefix}"),
            format!("subnet mask outside range 0-{width}"),
        ));
    }
    let host_bits = (width - prefix) as u32;
    // checked_shl covers the /0 case on IPv6, where the shift equals the width.
    let host_mask = 1u128
        .checked_shl(host_bits)
        .map(|b| b - 1)
        .unwrap_or(u128::MAX);
    Ok(family.all_bits() & !host_mask)
}

/// Inclusive `(ip_min, ip_max)` bounds of the subnet `network/prefix`.
pub fn range_for_subnet(network: u128, prefix: u8, family: Family) -> Result<(u128, u128)> {
    let mask = netmask_bits_to_integer(prefix, family)?;
    let ip_min = network & mask;
    let ip_max = network | (!mask & family.all_bits());
    Ok((ip_min, ip_max))
}

/// Prefix length of a range, computed from its size (`width - log2(size)`).
pub fn prefix_from_range(ip_min: u128, ip_max: u128, family: Family) -> u8 {
    let size_minus_one = ip_max.saturating_sub(ip_min);
    let host_bits = 128 - size_minus_one.leading_zeros();
    family.width().saturating_sub(host_bits as u8)
}

/// Dotted-quad netmask for an IPv4 prefix, e.g. `255.255.255.0` for /24.
pub fn netmask_to_address(prefix: u8) -> Result<String> {
    let mask = netmask_bits_to_integer(prefix, Family::V4)?;
    Ok(integer_to_address(mask, Family::V4))
}

//! CIDR notation for IPv4 and IPv6 subnets.

use super::address::{
    address_to_integer_for, integer_to_address, range_for_subnet, Family,
};
use crate::error::{Result, SubnetError};
use crate::validate;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A subnet in CIDR notation, stored as network address and prefix length.
#[derive(Eq, Ord, Debug, Copy, Clone, Hash, PartialEq, PartialOrd)]
pub struct Cidr {
    /// Address family.
    pub family: Family,
    /// The network address, host bits cleared.
    pub network: u128,
    /// The prefix length (0-32 or 0-128).
    pub prefix: u8,
}

impl Cidr {
    /// Create a new [`Cidr`] from a string such as `10.0.0.0/24`, `10.0.0/24`
    /// or `2001:db8::/64`.
    ///
    /// Host bits in the address are cleared, so `10.0.0.7/24` gives
    /// `10.0.0.0/24`.
    pub fn new(cidr: &str) -> Result<Cidr> {
        let cidr = cidr.trim();
        let (ip, mask) = cidr
            .split_once('/')
            .ok_or_else(|| SubnetError::format(cidr, "Not a valid subnet"))?;
        let family = Family::of(ip);
        validate::validate_subnet(cidr, family)?;

        let prefix: u8 = mask
            .parse()
            .map_err(|_| SubnetError::format(cidr, "Not a valid subnet"))?;
        let ip = if family == Family::V4 && ip.split('.').count() == 3 {
            format!("{ip}.0")
        } else {
            ip.to_string()
        };
        let addr = address_to_integer_for(&ip, family)?;
        Cidr::from_parts(addr, prefix, family)
    }

    /// Build a [`Cidr`] from an integer address and prefix length.
    pub fn from_parts(addr: u128, prefix: u8, family: Family) -> Result<Cidr> {
        let (network, _) = range_for_subnet(addr, prefix, family)?;
        Ok(Cidr {
            family,
            network,
            prefix,
        })
    }

    /// Lowest (network) address in the subnet.
    pub fn ip_min(&self) -> u128 {
        self.network
    }

    /// Highest (broadcast) address in the subnet.
    pub fn ip_max(&self) -> u128 {
        // prefix was validated on construction
        range_for_subnet(self.network, self.prefix, self.family)
            .map(|(_, hi)| hi)
            .unwrap_or(self.network)
    }

    /// Number of addresses in the subnet, saturating at `u128::MAX` for `::/0`.
    pub fn size(&self) -> u128 {
        (self.ip_max() - self.ip_min()).saturating_add(1)
    }

    /// True if `addr` lies within the subnet.
    pub fn contains(&self, addr: u128) -> bool {
        self.ip_min() <= addr && addr <= self.ip_max()
    }

    /// Canonical string form of the network address.
    pub fn network_address(&self) -> String {
        integer_to_address(self.network, self.family)
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.network_address(), self.prefix)
    }
}

impl Serialize for Cidr {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Cidr {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Cidr, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Cidr::new(&s).map_err(|e| de::Error::custom(format!("invalid CIDR: {e}")))
    }
}

//! Persisted subnet rows and range summaries exchanged with the store.

use super::address::{prefix_from_range, Family};
use super::Cidr;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identity assigned to a subnet by the store.
pub type SubnetId = u64;

/// Opaque id of whatever record holds an allocated address.
pub type AllocationId = u64;

/// Snapshot of allocated addresses, keyed by integer address.
pub type AllocatedAddresses = BTreeMap<u128, AllocationId>;

/// A subnet as persisted by the store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SubnetRecord {
    /// Store identity, `None` until first persisted.
    #[serde(default)]
    pub entity_id: Option<SubnetId>,
    /// The subnet in CIDR notation.
    pub subnet: Cidr,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub name_prefix: Option<String>,
    #[serde(default)]
    pub vlan_number: Option<u32>,
    #[serde(default)]
    pub dns_delegated: bool,
    /// Number of addresses reserved at the start of the subnet.
    #[serde(default)]
    pub no_of_reserved_adr: u32,
}

/// Address range of a stored subnet, as returned by overlap queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetRange {
    pub family: Family,
    /// Canonical network address string.
    pub subnet_ip: String,
    pub ip_min: u128,
    pub ip_max: u128,
}

impl SubnetRange {
    pub fn new(family: Family, subnet_ip: &str, ip_min: u128, ip_max: u128) -> SubnetRange {
        SubnetRange {
            family,
            subnet_ip: subnet_ip.to_string(),
            ip_min,
            ip_max,
        }
    }

    /// Prefix length recomputed from the range size.
    pub fn prefix(&self) -> u8 {
        prefix_from_range(self.ip_min, self.ip_max, self.family)
    }

    /// Two ranges overlap unless one ends before the other starts.
    pub fn overlaps(&self, other: &SubnetRange) -> bool {
        self.family == other.family
            && !(self.ip_max < other.ip_min || self.ip_min > other.ip_max)
    }
}

impl From<&SubnetRecord> for SubnetRange {
    fn from(record: &SubnetRecord) -> Self {
        SubnetRange::new(
            record.subnet.family,
            &record.subnet.network_address(),
            record.subnet.ip_min(),
            record.subnet.ip_max(),
        )
    }
}

impl fmt::Display for SubnetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.subnet_ip, self.prefix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(cidr: &str) -> SubnetRange {
        let record = SubnetRecord {
            entity_id: None,
            subnet: Cidr::new(cidr).unwrap(),
            description: String::new(),
            name_prefix: None,
            vlan_number: None,
            dns_delegated: false,
            no_of_reserved_adr: 0,
        };
        SubnetRange::from(&record)
    }

    #[test]
    fn test_range_display_recomputes_mask() {
        assert_eq!(range("10.0.0.0/24").to_string(), "10.0.0.0/24");
        assert_eq!(range("10.0.0.128/25").to_string(), "10.0.0.128/25");
    }

    #[test]
    fn test_overlaps() {
        let a = range("10.0.0.0/24");
        let b = range("10.0.0.128/25");
        let c = range("10.0.1.0/24");
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(!c.overlaps(&a));
        assert!(a.overlaps(&a));
    }

    #[test]
    fn test_overlaps_never_across_families() {
        let v4 = range("0.0.0.0/0");
        let v6 = range("::/96");
        assert_eq!(v4.ip_min, v6.ip_min);
        assert!(!v4.overlaps(&v6));
    }

    #[test]
    fn test_record_json() {
        let json = r#"{"entity_id": 7, "subnet": "10.0.0/24", "description": "lab"}"#;
        let record: SubnetRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.entity_id, Some(7));
        assert_eq!(record.subnet.to_string(), "10.0.0.0/24");
        assert_eq!(record.no_of_reserved_adr, 0);
        assert!(!record.dns_delegated);
    }
}

//! Summary of a single subnet for operators.

use super::finder::{count_unused, count_used};
use crate::models::{integer_to_address, netmask_to_address, AllocatedAddresses, Family, Subnet, SubnetId};

/// Everything `subnet_info` reports about one subnet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetInfo {
    /// `addr/prefix`
    pub subnet: String,
    pub entity_id: Option<SubnetId>,
    /// Dotted-quad netmask for IPv4, `/prefix` for IPv6.
    pub netmask: String,
    pub description: String,
    pub name_prefix: String,
    pub vlan_number: String,
    pub dns_delegated: bool,
    pub ip_range: String,
    pub reserved_count: u32,
    /// Reserved addresses, ascending, with `(net)`/`(broadcast)` labels on IPv4.
    pub reserved_addresses: Vec<String>,
    pub used: usize,
    pub unused: u128,
}

impl SubnetInfo {
    pub fn build(subnet: &Subnet, allocated: &AllocatedAddresses) -> SubnetInfo {
        let family = subnet.family();
        let netmask = match family {
            Family::V4 => netmask_to_address(subnet.prefix_length())
                .unwrap_or_else(|_| format!("/{}", subnet.prefix_length())),
            Family::V6 => format!("/{}", subnet.prefix_length()),
        };

        let mut reserved_addresses: Vec<String> = subnet
            .reserved_addresses()
            .iter()
            .map(|a| integer_to_address(*a, family))
            .collect();
        if family == Family::V4 && reserved_addresses.len() > 1 {
            if let Some(first) = reserved_addresses.first_mut() {
                first.push_str(" (net)");
            }
            if let Some(last) = reserved_addresses.last_mut() {
                last.push_str(" (broadcast)");
            }
        }

        SubnetInfo {
            subnet: subnet.to_string(),
            entity_id: subnet.entity_id(),
            netmask,
            description: subnet.description.clone(),
            name_prefix: subnet.name_prefix.clone().unwrap_or_default(),
            vlan_number: subnet
                .vlan_number
                .map(|v| v.to_string())
                .unwrap_or_default(),
            dns_delegated: subnet.dns_delegated,
            ip_range: format!(
                "{} - {}",
                integer_to_address(subnet.ip_min(), family),
                integer_to_address(subnet.ip_max(), family)
            ),
            reserved_count: subnet.reserved_count(),
            reserved_addresses,
            used: count_used(subnet, allocated),
            unused: count_unused(subnet, allocated),
        }
    }
}

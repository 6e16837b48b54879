//! Subnet processing logic.
//!
//! This module contains the operations on subnets and their addresses:
//! - [`overlap`] - Overlap detection across an inventory
//! - [`finder`] - Free address search
//! - [`lookup`] - Finding a stored subnet from user input
//! - [`admin`] - Administrative updates of stored subnets
//! - [`info`] - Per-subnet summary

mod admin;
mod finder;
mod info;
mod lookup;
mod overlap;

// Re-export public functions
pub use admin::{set_dns_delegated, set_name_prefix, set_reserved, set_vlan, unset_dns_delegated};
pub use finder::{
    count_unused, count_used, count_used_in_store, find_free_addresses, find_free_in_store,
    free_addresses, AllocationRequest, FreeAddresses, IPV6_DEFAULT_COUNT,
};
pub use info::SubnetInfo;
pub use lookup::{find_subnet, SubnetIdentifier};
pub use overlap::{
    check_for_duplicate_subnets, find_overlapping_records, find_overlaps, log_overlapping_subnets,
    overlaps, OverlapConflict,
};

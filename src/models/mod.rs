//! Domain models for the subnet allocator.
//!
//! This module contains the core data structures used throughout the crate:
//! - [`Family`] and the address arithmetic functions
//! - [`Cidr`] - Subnet in CIDR notation
//! - [`ReservedPolicy`] - Default reserved count per subnet size
//! - [`Subnet`] - Subnet entity with reserved addresses and lifecycle
//! - [`SubnetRecord`] and [`SubnetRange`] - Rows exchanged with the store

mod address;
mod cidr;
mod policy;
mod record;
mod subnet;

// Re-export public types
pub use address::{
    address_to_integer, address_to_integer_for, integer_to_address, netmask_bits_to_integer,
    netmask_to_address, prefix_from_range, range_for_subnet, Family, MAX_LENGTH_V4,
    MAX_LENGTH_V6,
};
pub use cidr::Cidr;
pub use policy::ReservedPolicy;
pub use record::{AllocatedAddresses, AllocationId, SubnetId, SubnetRange, SubnetRecord};
pub use subnet::{reserved_addresses_for, Subnet, SubnetState};

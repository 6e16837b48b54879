//! Persistence seam for subnets and allocated addresses.
//!
//! The allocator never reaches for a global database handle. Callers pass in
//! something implementing [`SubnetStore`] and [`AddressInventory`]:
//! - [`memory`] - In-memory store backed by a JSON inventory file
//!
//! Both traits hand out point-in-time snapshots. Nothing here locks: if two
//! callers race to insert overlapping subnets or to take the same free
//! address, the store's own write path (a uniqueness constraint, a
//! transaction around check and write) has to catch it.

mod memory;

use crate::error::StoreError;
use crate::models::{AllocatedAddresses, Family, SubnetId, SubnetRange, SubnetRecord};

pub use memory::{read_inventory, write_inventory, AllocationRecord, Inventory, MemoryStore};

/// Subnet persistence.
pub trait SubnetStore {
    /// Every stored subnet, both families.
    fn list_subnets(&self) -> Result<Vec<SubnetRecord>, StoreError>;

    /// Stored subnets of `family` whose range intersects `[ip_min, ip_max]`.
    fn list_overlapping_subnets(
        &self,
        family: Family,
        ip_min: u128,
        ip_max: u128,
    ) -> Result<Vec<SubnetRange>, StoreError>;

    /// Insert (`entity_id` is `None`) or update a subnet, returning its identity.
    fn persist_subnet(&mut self, record: SubnetRecord) -> Result<SubnetId, StoreError>;

    fn delete_subnet(&mut self, entity_id: SubnetId) -> Result<(), StoreError>;
}

/// Inventory of addresses held by live records (A/AAAA records and the like).
pub trait AddressInventory {
    /// Allocated addresses of `family` within `[ip_min, ip_max]`.
    fn list_allocated_addresses(
        &self,
        family: Family,
        ip_min: u128,
        ip_max: u128,
    ) -> Result<AllocatedAddresses, StoreError>;
}

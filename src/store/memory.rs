//! In-memory subnet store with a JSON inventory file.
//!
//! The inventory file holds the subnets and allocated addresses, so the
//! allocator can run without a database.

use super::{AddressInventory, SubnetStore};
use crate::error::{self, StoreError};
use crate::models::{
    address_to_integer, integer_to_address, AllocatedAddresses, AllocationId, Family, SubnetId,
    SubnetRange, SubnetRecord,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::path::Path;

/// An allocated address as written in the inventory file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AllocationRecord {
    /// Address string, IPv4 or IPv6.
    pub address: String,
    /// Id of the record holding the address.
    pub allocation_id: AllocationId,
}

/// Content of an inventory file.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Inventory {
    /// When the snapshot was last written.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub subnets: Vec<SubnetRecord>,
    #[serde(default)]
    pub addresses: Vec<AllocationRecord>,
}

/// Single-owner store; every change goes through `&mut self`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    subnets: BTreeMap<SubnetId, SubnetRecord>,
    allocated_v4: AllocatedAddresses,
    allocated_v6: AllocatedAddresses,
    next_id: SubnetId,
    updated_at: Option<DateTime<Utc>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Build a store from a parsed inventory.
    ///
    /// Records without an `entity_id` are given one. Duplicate ids and
    /// unparsable addresses are errors.
    pub fn from_inventory(inventory: Inventory) -> Result<MemoryStore, Box<dyn Error>> {
        let mut store = MemoryStore::new();
        store.updated_at = inventory.updated_at;
        store.next_id = inventory
            .subnets
            .iter()
            .filter_map(|s| s.entity_id)
            .max()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or("Subnet entity_id space exhausted in inventory")?;

        for mut record in inventory.subnets {
            let entity_id = match record.entity_id {
                Some(id) => id,
                None => store.take_id()?,
            };
            record.entity_id = Some(entity_id);
            if store.subnets.insert(entity_id, record).is_some() {
                return Err(format!("Duplicate subnet entity_id {entity_id} in inventory").into());
            }
        }
        for allocation in inventory.addresses {
            store
                .allocate(&allocation.address, allocation.allocation_id)
                .map_err(|e| format!("Bad address in inventory: {e}"))?;
        }
        log::debug!(
            "Loaded inventory: {} subnets, {} IPv4 + {} IPv6 allocated addresses",
            store.subnets.len(),
            store.allocated_v4.len(),
            store.allocated_v6.len()
        );
        Ok(store)
    }

    /// Snapshot of the store, stamped with the current time.
    pub fn to_inventory(&self) -> Inventory {
        let addresses = [(Family::V4, &self.allocated_v4), (Family::V6, &self.allocated_v6)]
            .into_iter()
            .flat_map(|(family, allocated)| {
                allocated.iter().map(move |(addr, id)| AllocationRecord {
                    address: integer_to_address(*addr, family),
                    allocation_id: *id,
                })
            })
            .collect();
        Inventory {
            updated_at: Some(Utc::now()),
            subnets: self.subnets.values().cloned().collect(),
            addresses,
        }
    }

    /// Time the loaded snapshot was written, if known.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Mark `address` as allocated to `allocation_id`.
    pub fn allocate(&mut self, address: &str, allocation_id: AllocationId) -> error::Result<()> {
        let family = Family::of(address);
        let addr = address_to_integer(address)?;
        self.allocated_mut(family).insert(addr, allocation_id);
        Ok(())
    }

    /// Release `address`, returning the id that held it.
    pub fn release(&mut self, address: &str) -> error::Result<Option<AllocationId>> {
        let family = Family::of(address);
        let addr = address_to_integer(address)?;
        Ok(self.allocated_mut(family).remove(&addr))
    }

    /// All allocated addresses of `family`.
    pub fn allocated(&self, family: Family) -> &AllocatedAddresses {
        match family {
            Family::V4 => &self.allocated_v4,
            Family::V6 => &self.allocated_v6,
        }
    }

    fn allocated_mut(&mut self, family: Family) -> &mut AllocatedAddresses {
        match family {
            Family::V4 => &mut self.allocated_v4,
            Family::V6 => &mut self.allocated_v6,
        }
    }

    fn take_id(&mut self) -> Result<SubnetId, StoreError> {
        let id = self.next_id;
        self.next_id = id
            .checked_add(1)
            .ok_or_else(|| StoreError("Subnet entity_id space exhausted".to_string()))?;
        Ok(id)
    }
}

impl SubnetStore for MemoryStore {
    fn list_subnets(&self) -> Result<Vec<SubnetRecord>, StoreError> {
        Ok(self.subnets.values().cloned().collect())
    }

    fn list_overlapping_subnets(
        &self,
        family: Family,
        ip_min: u128,
        ip_max: u128,
    ) -> Result<Vec<SubnetRange>, StoreError> {
        let wanted = SubnetRange::new(family, "", ip_min, ip_max);
        Ok(self
            .subnets
            .values()
            .map(SubnetRange::from)
            .filter(|range| range.overlaps(&wanted))
            .collect())
    }

    fn persist_subnet(&mut self, mut record: SubnetRecord) -> Result<SubnetId, StoreError> {
        let entity_id = match record.entity_id {
            Some(id) if self.subnets.contains_key(&id) => id,
            Some(id) => return Err(StoreError(format!("No subnet with entity_id {id}"))),
            None => self.take_id()?,
        };
        record.entity_id = Some(entity_id);
        self.subnets.insert(entity_id, record);
        Ok(entity_id)
    }

    fn delete_subnet(&mut self, entity_id: SubnetId) -> Result<(), StoreError> {
        self.subnets
            .remove(&entity_id)
            .map(|_| ())
            .ok_or_else(|| StoreError(format!("No subnet with entity_id {entity_id}")))
    }
}

impl AddressInventory for MemoryStore {
    fn list_allocated_addresses(
        &self,
        family: Family,
        ip_min: u128,
        ip_max: u128,
    ) -> Result<AllocatedAddresses, StoreError> {
        if ip_min > ip_max {
            return Ok(AllocatedAddresses::new());
        }
        Ok(self
            .allocated(family)
            .range(ip_min..=ip_max)
            .map(|(addr, id)| (*addr, *id))
            .collect())
    }
}

/// Read an inventory file into a [`MemoryStore`].
///
/// # Arguments
/// * `path` - Path of the JSON inventory file
///
/// # Returns
/// * `Ok(MemoryStore)` - The loaded store
/// * `Err` - If the file is missing or not a valid inventory; parse errors
///   name the JSON path of the offending value
pub fn read_inventory(path: &str) -> Result<MemoryStore, Box<dyn Error>> {
    if !Path::new(path).exists() {
        return Err(format!("Inventory file does not exist: {path}").into());
    }
    log::info!("Reading inventory file: {path}");
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("Error reading inventory file {path}: {e}"))?;

    let mut deserializer = serde_json::Deserializer::from_str(&json);
    let inventory: Inventory = serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| format!("Error parsing inventory {path}: path={} error={}", e.path(), e))?;

    MemoryStore::from_inventory(inventory)
}

/// Write the store to an inventory file.
pub fn write_inventory(path: &str, store: &MemoryStore) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(&store.to_inventory())
        .map_err(|e| format!("Error serializing inventory: {e}"))?;
    log::warn!("Writing inventory file: {path}");
    std::fs::write(path, json).map_err(|e| format!("Error writing inventory file {path}: {e}"))?;
    Ok(())
}

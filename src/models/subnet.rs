//! Subnet entity: address range, reserved addresses and lifecycle.
//!
//! A [`Subnet`] starts out as a draft built from a CIDR string, becomes
//! stored once it has passed validation and been persisted, and ends up
//! deleted. The range never changes after creation; only the metadata and
//! the number of reserved addresses do.

use super::address::{integer_to_address, Family};
use super::policy::ReservedPolicy;
use super::record::{AllocatedAddresses, SubnetId, SubnetRange, SubnetRecord};
use super::Cidr;
use crate::error::{Result, SubnetError};
use crate::store::{AddressInventory, SubnetStore};
use std::collections::BTreeSet;
use std::fmt;

/// Lifecycle state of a [`Subnet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubnetState {
    /// Built and validated locally, not persisted.
    Draft,
    /// Persisted in the store under `entity_id`.
    Stored { entity_id: SubnetId },
    /// Removed from the store.
    Deleted { entity_id: SubnetId },
}

impl SubnetState {
    pub fn name(&self) -> &'static str {
        match self {
            SubnetState::Draft => "draft",
            SubnetState::Stored { .. } => "stored",
            SubnetState::Deleted { .. } => "deleted",
        }
    }
}

/// A DNS subnet with its reserved-address set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subnet {
    cidr: Cidr,
    reserved_count: u32,
    reserved: BTreeSet<u128>,
    /// Free text; local policy may give it a parsable format.
    pub description: String,
    pub name_prefix: Option<String>,
    pub vlan_number: Option<u32>,
    /// Whether the zone is delegated to an external DNS server.
    pub dns_delegated: bool,
    state: SubnetState,
}

/// Compute the reserved addresses of `cidr` for `reserved_count`.
///
/// IPv4 always reserves the network and broadcast address, then the
/// `reserved_count` addresses right after the network address. /22 and /23
/// nets also keep a few addresses around the internal /24 boundaries free to
/// ease future netsplits. IPv6 reserves the first `reserved_count` addresses,
/// network address included.
pub fn reserved_addresses_for(cidr: &Cidr, reserved_count: u32) -> Result<BTreeSet<u128>> {
    let (ip_min, ip_max) = (cidr.ip_min(), cidr.ip_max());
    let count = reserved_count as u128;
    let mut reserved = BTreeSet::new();

    match cidr.family {
        Family::V4 => {
            if reserved_count == 0 {
                reserved.insert(ip_min);
                // Add the broadcast unless /32 net
                if ip_min < ip_max {
                    reserved.insert(ip_max);
                }
                return Ok(reserved);
            }
            if count > ip_max - ip_min {
                return Err(SubnetError::Policy {
                    requested: reserved_count,
                    available: ip_max - ip_min,
                });
            }
            reserved.extend((1..=count).map(|x| ip_min + x));
            reserved.insert(ip_min);
            reserved.insert(ip_max);

            match cidr.prefix {
                22 => reserved.extend([255, 256, 511, 512].map(|x| ip_min + x)),
                23 => reserved.extend([255, 256].map(|x| ip_min + x)),
                _ => {}
            }
        }
        Family::V6 => {
            if reserved_count == 0 {
                return Ok(reserved);
            }
            if count > ip_max - ip_min {
                return Err(SubnetError::Policy {
                    requested: reserved_count,
                    available: ip_max - ip_min,
                });
            }
            reserved.extend((0..count).map(|x| ip_min + x));
        }
    }
    Ok(reserved)
}

impl Subnet {
    /// Create a draft subnet, taking the reserved count from `policy`.
    ///
    /// # Arguments
    /// * `cidr` - The subnet, e.g. `10.0.0.0/16` or `10.0.0/16`
    /// * `description` - Free text describing the subnet
    /// * `policy` - Default reserved count per prefix length
    pub fn create(cidr: &str, description: &str, policy: &ReservedPolicy) -> Result<Subnet> {
        let parsed = Cidr::new(cidr)?;
        Subnet::create_with_reserved(cidr, description, policy.reserved_for(parsed.prefix))
    }

    /// Create a draft subnet with an explicit reserved count.
    pub fn create_with_reserved(
        cidr: &str,
        description: &str,
        reserved_count: u32,
    ) -> Result<Subnet> {
        let cidr = Cidr::new(cidr)?;
        let reserved = reserved_addresses_for(&cidr, reserved_count)?;
        log::debug!(
            "Draft subnet {cidr}: {} reserved address(es) for reserved_count={reserved_count}",
            reserved.len()
        );
        Ok(Subnet {
            cidr,
            reserved_count,
            reserved,
            description: description.to_string(),
            name_prefix: None,
            vlan_number: None,
            dns_delegated: false,
            state: SubnetState::Draft,
        })
    }

    /// Set the VLAN number on a subnet being built.
    pub fn with_vlan(mut self, vlan: u32) -> Subnet {
        self.vlan_number = Some(vlan);
        self
    }

    /// Rebuild a subnet from its persisted record.
    ///
    /// Records with an `entity_id` come back as stored, others as drafts.
    pub fn from_record(record: &SubnetRecord) -> Result<Subnet> {
        let reserved = reserved_addresses_for(&record.subnet, record.no_of_reserved_adr)?;
        Ok(Subnet {
            cidr: record.subnet,
            reserved_count: record.no_of_reserved_adr,
            reserved,
            description: record.description.clone(),
            name_prefix: record.name_prefix.clone(),
            vlan_number: record.vlan_number,
            dns_delegated: record.dns_delegated,
            state: match record.entity_id {
                Some(entity_id) => SubnetState::Stored { entity_id },
                None => SubnetState::Draft,
            },
        })
    }

    /// The record the store persists for this subnet.
    pub fn to_record(&self) -> SubnetRecord {
        SubnetRecord {
            entity_id: self.entity_id(),
            subnet: self.cidr,
            description: self.description.clone(),
            name_prefix: self.name_prefix.clone(),
            vlan_number: self.vlan_number,
            dns_delegated: self.dns_delegated,
            no_of_reserved_adr: self.reserved_count,
        }
    }

    pub fn cidr(&self) -> &Cidr {
        &self.cidr
    }

    pub fn family(&self) -> Family {
        self.cidr.family
    }

    /// Canonical network address string (exploded for IPv6).
    pub fn network_address(&self) -> String {
        self.cidr.network_address()
    }

    pub fn prefix_length(&self) -> u8 {
        self.cidr.prefix
    }

    pub fn ip_min(&self) -> u128 {
        self.cidr.ip_min()
    }

    pub fn ip_max(&self) -> u128 {
        self.cidr.ip_max()
    }

    pub fn reserved_count(&self) -> u32 {
        self.reserved_count
    }

    pub fn reserved_addresses(&self) -> &BTreeSet<u128> {
        &self.reserved
    }

    pub fn is_reserved(&self, addr: u128) -> bool {
        self.reserved.contains(&addr)
    }

    pub fn contains(&self, addr: u128) -> bool {
        self.cidr.contains(addr)
    }

    pub fn state(&self) -> SubnetState {
        self.state
    }

    /// Store identity, if the subnet has ever been persisted.
    pub fn entity_id(&self) -> Option<SubnetId> {
        match self.state {
            SubnetState::Draft => None,
            SubnetState::Stored { entity_id } | SubnetState::Deleted { entity_id } => {
                Some(entity_id)
            }
        }
    }

    pub fn range(&self) -> SubnetRange {
        SubnetRange::new(
            self.family(),
            &self.network_address(),
            self.ip_min(),
            self.ip_max(),
        )
    }

    /// Change the number of reserved addresses and recompute the reserved set.
    ///
    /// On error the previous count and set are kept.
    pub fn set_reserved_count(&mut self, reserved_count: u32) -> Result<()> {
        let reserved = reserved_addresses_for(&self.cidr, reserved_count)?;
        self.reserved_count = reserved_count;
        self.reserved = reserved;
        Ok(())
    }

    /// Fail with [`SubnetError::Overlap`] if any of `existing` intersects this subnet.
    pub fn validate_no_overlap(&self, existing: &[SubnetRange]) -> Result<()> {
        let own = self.range();
        let conflicts: Vec<SubnetRange> = existing
            .iter()
            .filter(|other| own.overlaps(other))
            .cloned()
            .collect();
        if conflicts.is_empty() {
            return Ok(());
        }
        log::warn!(
            "Subnet {} overlaps {} existing subnet(s)",
            self,
            conflicts.len()
        );
        Err(SubnetError::Overlap {
            subnet: self.to_string(),
            conflicts,
        })
    }

    /// Fail with [`SubnetError::ReservedInUse`] if any reserved address is allocated.
    pub fn validate_reserved_not_in_use(&self, allocated: &AllocatedAddresses) -> Result<()> {
        let in_use: Vec<String> = allocated
            .range(self.ip_min()..=self.ip_max())
            .filter(|(addr, _)| self.reserved.contains(addr))
            .map(|(addr, _)| integer_to_address(*addr, self.family()))
            .collect();
        if in_use.is_empty() {
            return Ok(());
        }
        Err(SubnetError::ReservedInUse {
            subnet: self.to_string(),
            addresses: in_use,
        })
    }

    /// Persist the subnet.
    ///
    /// A draft is checked for overlaps against every stored subnet and, when
    /// `perform_checks` is set, for allocated reserved addresses, before it
    /// is inserted. A stored subnet only has its metadata and reserved count
    /// written back; its range is never re-checked for overlaps.
    ///
    /// Validation and write are two separate store calls; a store shared
    /// between writers must run both in one transaction.
    pub fn commit<S>(&mut self, store: &mut S, perform_checks: bool) -> Result<SubnetId>
    where
        S: SubnetStore + AddressInventory + ?Sized,
    {
        let family = self.family();
        match self.state {
            SubnetState::Draft => {
                let overlapping =
                    store.list_overlapping_subnets(family, self.ip_min(), self.ip_max())?;
                self.validate_no_overlap(&overlapping)?;
                if perform_checks {
                    let allocated =
                        store.list_allocated_addresses(family, self.ip_min(), self.ip_max())?;
                    self.validate_reserved_not_in_use(&allocated)?;
                }
                let entity_id = store.persist_subnet(self.to_record())?;
                self.state = SubnetState::Stored { entity_id };
                log::info!("Created subnet {self} as entity_id={entity_id}");
                Ok(entity_id)
            }
            SubnetState::Stored { entity_id } => {
                if perform_checks {
                    let allocated =
                        store.list_allocated_addresses(family, self.ip_min(), self.ip_max())?;
                    self.validate_reserved_not_in_use(&allocated)?;
                }
                store.persist_subnet(self.to_record())?;
                log::info!("Updated subnet {self} entity_id={entity_id}");
                Ok(entity_id)
            }
            SubnetState::Deleted { .. } => Err(self.state_error("commit")),
        }
    }

    /// Delete a stored subnet.
    ///
    /// Fails with [`SubnetError::AddressesInUse`] while any address in the
    /// range is allocated, unless `force` is set.
    pub fn delete<S>(&mut self, store: &mut S, force: bool) -> Result<()>
    where
        S: SubnetStore + AddressInventory + ?Sized,
    {
        let entity_id = match self.state {
            SubnetState::Stored { entity_id } => entity_id,
            _ => return Err(self.state_error("delete")),
        };
        let allocated =
            store.list_allocated_addresses(self.family(), self.ip_min(), self.ip_max())?;
        if !allocated.is_empty() {
            if !force {
                return Err(SubnetError::AddressesInUse {
                    subnet: self.to_string(),
                    addresses: allocated
                        .keys()
                        .map(|a| integer_to_address(*a, self.family()))
                        .collect(),
                });
            }
            log::warn!(
                "Forced delete of subnet {self} with {} address(es) in use",
                allocated.len()
            );
        }
        store.delete_subnet(entity_id)?;
        self.state = SubnetState::Deleted { entity_id };
        log::info!("Deleted subnet {self} entity_id={entity_id}");
        Ok(())
    }

    fn state_error(&self, operation: &'static str) -> SubnetError {
        SubnetError::State {
            subnet: self.to_string(),
            operation,
            state: self.state.name(),
        }
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cidr)
    }
}

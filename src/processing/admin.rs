//! Administrative updates of stored subnets.
//!
//! Each operation changes one property, writes the subnet back without the
//! reserved-address checks of a regular commit and returns a message for
//! the operator.

use crate::error::{Result, SubnetError};
use crate::models::{integer_to_address, Subnet};
use crate::store::{AddressInventory, SubnetStore};

/// Write `updated` to the store and copy it into `subnet` on success.
fn persist<S>(store: &mut S, subnet: &mut Subnet, mut updated: Subnet) -> Result<()>
where
    S: SubnetStore + AddressInventory + ?Sized,
{
    updated.commit(store, false)?;
    *subnet = updated;
    Ok(())
}

/// Change the number of reserved addresses.
///
/// # Arguments
/// * `store` - Store holding the subnet and its allocated addresses
/// * `subnet` - A stored subnet
/// * `reserved_count` - The new count
///
/// # Returns
/// * `Ok(None)` - Updated, nothing to report
/// * `Ok(Some(note))` - Updated, but some of the newly reserved addresses are
///   already allocated; they stay allocated and are listed in the note
/// * `Err` - If the count does not fit the subnet or the store fails
pub fn set_reserved<S>(store: &mut S, subnet: &mut Subnet, reserved_count: u32) -> Result<Option<String>>
where
    S: SubnetStore + AddressInventory + ?Sized,
{
    let old_count = subnet.reserved_count();
    let mut updated = subnet.clone();
    updated.set_reserved_count(reserved_count)?;

    let mut note = None;
    if reserved_count > old_count {
        let allocated =
            store.list_allocated_addresses(updated.family(), updated.ip_min(), updated.ip_max())?;
        if let Err(SubnetError::ReservedInUse { addresses, .. }) =
            updated.validate_reserved_not_in_use(&allocated)
        {
            log::warn!(
                "Subnet {updated}: {} newly reserved address(es) already in use",
                addresses.len()
            );
            note = Some(format!(
                "FYI: The following reserved addresses are in use: {}",
                addresses.join(", ")
            ));
        }
    }

    persist(store, subnet, updated)?;
    log::info!("Subnet {subnet}: reserved addresses {old_count} -> {reserved_count}");
    Ok(note)
}

/// Mark the subnet as delegated to an external DNS server.
///
/// Fails with [`SubnetError::AddressesInUse`] while addresses in the subnet
/// are allocated, unless `force` is set.
pub fn set_dns_delegated<S>(store: &mut S, subnet: &mut Subnet, force: bool) -> Result<String>
where
    S: SubnetStore + AddressInventory + ?Sized,
{
    if subnet.dns_delegated {
        return Ok(format!("Subnet {subnet} already is DNS-delegated"));
    }
    let allocated =
        store.list_allocated_addresses(subnet.family(), subnet.ip_min(), subnet.ip_max())?;
    if !allocated.is_empty() {
        if !force {
            return Err(SubnetError::AddressesInUse {
                subnet: subnet.to_string(),
                addresses: allocated
                    .keys()
                    .map(|a| integer_to_address(*a, subnet.family()))
                    .collect(),
            });
        }
        log::warn!(
            "Forced DNS delegation of subnet {subnet} with {} address(es) in use",
            allocated.len()
        );
    }

    let mut updated = subnet.clone();
    updated.dns_delegated = true;
    persist(store, subnet, updated)?;
    Ok(format!("Subnet {subnet} set as delegated to external DNS server"))
}

/// Clear the DNS delegation flag.
pub fn unset_dns_delegated<S>(store: &mut S, subnet: &mut Subnet) -> Result<String>
where
    S: SubnetStore + AddressInventory + ?Sized,
{
    if !subnet.dns_delegated {
        return Ok(format!("Subnet {subnet} is not DNS-delegated"));
    }
    let mut updated = subnet.clone();
    updated.dns_delegated = false;
    persist(store, subnet, updated)?;
    Ok(format!("Subnet {subnet} no longer set as delegated to external DNS server"))
}

/// Set the VLAN number.
pub fn set_vlan<S>(store: &mut S, subnet: &mut Subnet, vlan: u32) -> Result<String>
where
    S: SubnetStore + AddressInventory + ?Sized,
{
    let old = subnet.vlan_number;
    let mut updated = subnet.clone();
    updated.vlan_number = Some(vlan);
    persist(store, subnet, updated)?;
    Ok(format!(
        "OK; VLAN for subnet {subnet} updated from {} to {vlan}",
        old.map(|v| v.to_string()).unwrap_or_else(|| "none".to_string())
    ))
}

/// Set the host name prefix used for addresses in the subnet.
pub fn set_name_prefix<S>(store: &mut S, subnet: &mut Subnet, name_prefix: &str) -> Result<String>
where
    S: SubnetStore + AddressInventory + ?Sized,
{
    let old = subnet.name_prefix.clone().unwrap_or_default();
    let mut updated = subnet.clone();
    updated.name_prefix = Some(name_prefix.to_string());
    persist(store, subnet, updated)?;
    Ok(format!(
        "OK; name_prefix for subnet {subnet} updated from '{old}' to '{name_prefix}'"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Family, SubnetState};
    use crate::store::MemoryStore;

    fn stored(store: &mut MemoryStore, cidr: &str, reserved: u32) -> Subnet {
        let mut subnet = Subnet::create_with_reserved(cidr, "", reserved).unwrap();
        subnet.commit(store, true).unwrap();
        subnet
    }

    #[test]
    fn test_set_reserved_grow_reports_in_use() {
        let mut store = MemoryStore::new();
        let mut subnet = stored(&mut store, "10.0.0.0/24", 2);
        store.allocate("10.0.0.4", 10).unwrap();

        let note = set_reserved(&mut store, &mut subnet, 5).unwrap();
        assert_eq!(
            note.as_deref(),
            Some("FYI: The following reserved addresses are in use: 10.0.0.4")
        );
        assert_eq!(subnet.reserved_count(), 5);
        assert_eq!(store.list_subnets().unwrap()[0].no_of_reserved_adr, 5);
        assert_eq!(store.allocated(Family::V4).len(), 1, "allocation untouched");
    }

    #[test]
    fn test_set_reserved_shrink() {
        let mut store = MemoryStore::new();
        let mut subnet = stored(&mut store, "10.0.0.0/24", 5);
        assert_eq!(set_reserved(&mut store, &mut subnet, 1).unwrap(), None);
        assert_eq!(subnet.reserved_addresses().len(), 3);
    }

    #[test]
    fn test_set_reserved_too_large_leaves_subnet() {
        let mut store = MemoryStore::new();
        let mut subnet = stored(&mut store, "10.0.0.0/30", 0);
        let before = subnet.clone();
        assert!(matches!(
            set_reserved(&mut store, &mut subnet, 10),
            Err(SubnetError::Policy { .. })
        ));
        assert_eq!(subnet, before);
        assert_eq!(store.list_subnets().unwrap()[0].no_of_reserved_adr, 0);
    }

    #[test]
    fn test_set_reserved_on_draft_inserts() {
        let mut store = MemoryStore::new();
        let mut subnet = Subnet::create_with_reserved("10.0.0.0/24", "", 0).unwrap();
        // a draft goes through a full commit, which inserts it
        set_reserved(&mut store, &mut subnet, 3).unwrap();
        assert_eq!(subnet.state(), SubnetState::Stored { entity_id: 1 });
    }

    #[test]
    fn test_set_dns_delegated() {
        let mut store = MemoryStore::new();
        let mut subnet = stored(&mut store, "10.0.0.0/24", 0);
        store.allocate("10.0.0.9", 1).unwrap();

        let err = set_dns_delegated(&mut store, &mut subnet, false).unwrap_err();
        assert_eq!(
            err,
            SubnetError::AddressesInUse {
                subnet: "10.0.0.0/24".to_string(),
                addresses: vec!["10.0.0.9".to_string()],
            }
        );
        assert!(!subnet.dns_delegated);

        set_dns_delegated(&mut store, &mut subnet, true).unwrap();
        assert!(subnet.dns_delegated);
        assert!(store.list_subnets().unwrap()[0].dns_delegated);

        let msg = set_dns_delegated(&mut store, &mut subnet, false).unwrap();
        assert!(msg.contains("already"), "{msg}");

        unset_dns_delegated(&mut store, &mut subnet).unwrap();
        assert!(!store.list_subnets().unwrap()[0].dns_delegated);
    }

    #[test]
    fn test_set_vlan_and_name_prefix() {
        let mut store = MemoryStore::new();
        let mut subnet = stored(&mut store, "2001:db8::/64", 0);

        let msg = set_vlan(&mut store, &mut subnet, 200).unwrap();
        assert!(msg.contains("from none to 200"), "{msg}");
        let msg = set_vlan(&mut store, &mut subnet, 201).unwrap();
        assert!(msg.contains("from 200 to 201"), "{msg}");

        let msg = set_name_prefix(&mut store, &mut subnet, "lab-").unwrap();
        assert!(msg.contains("from '' to 'lab-'"), "{msg}");

        let record = &store.list_subnets().unwrap()[0];
        assert_eq!(record.vlan_number, Some(201));
        assert_eq!(record.name_prefix.as_deref(), Some("lab-"));
    }

    #[test]
    fn test_update_deleted_subnet_fails() {
        let mut store = MemoryStore::new();
        let mut subnet = stored(&mut store, "10.0.0.0/24", 0);
        subnet.delete(&mut store, false).unwrap();
        assert!(matches!(
            set_vlan(&mut store, &mut subnet, 5),
            Err(SubnetError::State { .. })
        ));
        assert_eq!(subnet.vlan_number, None);
    }
}

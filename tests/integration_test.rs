//! Integration tests for dns-subnet-allocator
//!
//! These tests verify the complete workflow from reading an inventory to
//! creating, updating and deleting subnets.

use dns_subnet_allocator::{
    check_for_duplicate_subnets,
    config::Config,
    load_inventory,
    models::{address_to_integer, integer_to_address, Family, Subnet, SubnetState},
    processing::{
        find_free_in_store, find_overlapping_records, find_subnet, set_reserved,
        AllocationRequest, SubnetInfo,
    },
    store::{AddressInventory, MemoryStore, SubnetStore},
    SubnetError,
};

fn inventory(file: &str) -> MemoryStore {
    load_inventory(Some(file), &Config::default()).expect("Failed to read inventory")
}

#[test]
fn test_full_workflow_with_inventory() {
    let mut store = inventory("src/tests/test_data/inventory_01.json");
    let records = store.list_subnets().expect("list_subnets");
    assert_eq!(records.len(), 3, "Expected 3 subnets in test data");
    check_for_duplicate_subnets(&records).expect("Found unexpected duplicates");
    assert!(find_overlapping_records(&records).is_empty());

    // Free addresses skip the 11 reserved and 3 allocated ones
    let subnet = find_subnet(&store, "129.240.2.0/24").expect("find_subnet");
    let free = find_free_in_store(&store, &subnet, &AllocationRequest::new().with_count(12))
        .expect("free addresses");
    let free: Vec<String> = free.iter().map(|a| integer_to_address(*a, Family::V4)).collect();
    assert_eq!(free[0], "129.240.2.10");
    assert_eq!(free[10], "129.240.2.22", "skips .20 and .21");

    // New subnet next to the existing ones
    let config = Config::default();
    let mut created = Subnet::create("129.240.3/24", "Lab net 2", &config.reserved_v4)
        .expect("create")
        .with_vlan(403);
    let id = created.commit(&mut store, true).expect("commit");
    assert_eq!(id, 4);
    assert_eq!(created.state(), SubnetState::Stored { entity_id: 4 });
    assert_eq!(find_subnet(&store, "129.240.3.77").unwrap(), created);

    // Grow the reserved range over an allocated address
    let mut subnet = find_subnet(&store, "id:1").unwrap();
    let note = set_reserved(&mut store, &mut subnet, 25).expect("set_reserved");
    assert!(note.unwrap().contains("129.240.2.20, 129.240.2.21"));

    let allocated = store
        .list_allocated_addresses(Family::V4, subnet.ip_min(), subnet.ip_max())
        .unwrap();
    let info = SubnetInfo::build(&subnet, &allocated);
    assert_eq!(info.reserved_count, 25);
    assert_eq!(info.used, 3);
    assert_eq!(info.unused, 256 - 27 - 1);
}

#[test]
fn test_overlapping_subnet_rejected() {
    // 10.0.0.0/16 stored, 10.0.1.0/24 must be rejected
    let mut store = MemoryStore::new();
    Subnet::create_with_reserved("10.0.0.0/16", "", 9)
        .unwrap()
        .commit(&mut store, true)
        .unwrap();

    let mut subnet = Subnet::create_with_reserved("10.0.1.0/24", "", 9).unwrap();
    let err = subnet.commit(&mut store, true).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Subnet '10.0.1.0/24' overlaps with the following subnet(s): '10.0.0.0/16'"
    );
    assert!(matches!(err, SubnetError::Overlap { ref conflicts, .. } if conflicts.len() == 1));
    assert_eq!(subnet.state(), SubnetState::Draft);
    assert_eq!(store.list_subnets().unwrap().len(), 1);

    // Other family at the same numeric range is fine
    Subnet::create_with_reserved("::a00:0/112", "", 0)
        .unwrap()
        .commit(&mut store, true)
        .unwrap();
}

#[test]
fn test_reserved_in_use_blocks_commit() {
    let mut store = MemoryStore::new();
    store.allocate("10.0.0.3", 1).unwrap();

    let mut subnet = Subnet::create_with_reserved("10.0.0.0/24", "", 5).unwrap();
    assert!(matches!(
        subnet.commit(&mut store, true),
        Err(SubnetError::ReservedInUse { .. })
    ));
    // Without checks the subnet is stored and the allocation left alone
    subnet.commit(&mut store, false).unwrap();
    assert_eq!(store.allocated(Family::V4).len(), 1);
}

#[test]
fn test_inventory_with_overlaps() {
    let mut store = inventory("src/tests/test_data/inventory_overlap.json");
    let records = store.list_subnets().unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(records[3].entity_id, Some(4), "ids assigned after the largest");

    let conflicts = find_overlapping_records(&records);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].first.1.to_string(), "10.0.0.0/16");
    assert_eq!(conflicts[0].second.1.to_string(), "10.0.4.0/22");

    // The imported /22 holds an allocated address
    let mut subnet = find_subnet(&store, "10.0.4/22").unwrap();
    assert!(matches!(
        subnet.delete(&mut store, false),
        Err(SubnetError::AddressesInUse { .. })
    ));
    subnet.delete(&mut store, true).unwrap();
    assert_eq!(subnet.state(), SubnetState::Deleted { entity_id: 2 });
    assert!(find_overlapping_records(&store.list_subnets().unwrap()).is_empty());

    // A deleted subnet cannot be deleted again
    assert!(matches!(
        subnet.delete(&mut store, true),
        Err(SubnetError::State { .. })
    ));
}

#[test]
fn test_ipv6_free_addresses_after_reserved() {
    let store = inventory("src/tests/test_data/inventory_01.json");
    let subnet = find_subnet(&store, "2001:700:100:1::1").unwrap();
    assert_eq!(subnet.reserved_count(), 100);

    let free = find_free_in_store(&store, &subnet, &AllocationRequest::new()).unwrap();
    assert_eq!(free.len(), 100);
    assert_eq!(free[0], subnet.ip_min() + 100);
    // ::100 and ::101 are allocated (0x100 = 256)
    assert!(!free.contains(&address_to_integer("2001:700:100:1::100").unwrap()));
    assert_eq!(*free.last().unwrap(), subnet.ip_min() + 199);

    let request = AllocationRequest::new().starting_at(255).with_count(2);
    let free = find_free_in_store(&store, &subnet, &request).unwrap();
    assert_eq!(free, vec![subnet.ip_min() + 255, subnet.ip_min() + 258]);
}

#[test]
fn test_leading_zero_rejected() {
    assert!(matches!(
        address_to_integer("10.0.0.01"),
        Err(SubnetError::Format { .. })
    ));
    assert!(matches!(
        Subnet::create_with_reserved("10.0.00.0/24", "", 0),
        Err(SubnetError::Format { .. })
    ));
    assert!(!dns_subnet_allocator::validate_cidr("010.0.0.0/8"));
}

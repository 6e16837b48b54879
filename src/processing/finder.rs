//! Free address search within a subnet.
//!
//! The finder works on a snapshot of allocated addresses handed in by the
//! caller and keeps no cursor between calls. To continue a search, call
//! again with a later `search_start` or `first`.

use crate::error::{Result, SubnetError};
use crate::models::{AllocatedAddresses, Family, Subnet};
use crate::store::AddressInventory;

/// Number of free IPv6 addresses returned when the request gives no count.
pub const IPV6_DEFAULT_COUNT: usize = 100;

/// Parameters of a free address search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocationRequest {
    /// Drop results below this address.
    pub first: Option<u128>,
    /// Stop after this many results.
    pub count: Option<usize>,
    /// Offset from the network address to start scanning at (IPv6 only).
    pub search_start: u128,
}

impl AllocationRequest {
    pub fn new() -> AllocationRequest {
        AllocationRequest::default()
    }

    pub fn with_first(mut self, first: u128) -> AllocationRequest {
        self.first = Some(first);
        self
    }

    pub fn with_count(mut self, count: usize) -> AllocationRequest {
        self.count = Some(count);
        self
    }

    pub fn starting_at(mut self, search_start: u128) -> AllocationRequest {
        self.search_start = search_start;
        self
    }
}

/// Lazy, ascending iterator over the free addresses of a subnet.
pub struct FreeAddresses<'a> {
    subnet: &'a Subnet,
    allocated: &'a AllocatedAddresses,
    next_offset: Option<u128>,
    last_offset: u128,
    remaining: Option<usize>,
}

impl<'a> FreeAddresses<'a> {
    /// Scan `subnet` from `search_start` (ignored for IPv4), yielding at most
    /// `count` addresses.
    pub fn new(
        subnet: &'a Subnet,
        allocated: &'a AllocatedAddresses,
        search_start: u128,
        count: Option<usize>,
    ) -> FreeAddresses<'a> {
        let last_offset = subnet.ip_max() - subnet.ip_min();
        let start = match subnet.family() {
            Family::V4 => 0,
            Family::V6 => search_start,
        };
        FreeAddresses {
            subnet,
            allocated,
            next_offset: (start <= last_offset).then_some(start),
            last_offset,
            remaining: count,
        }
    }
}

impl<'a> Iterator for FreeAddresses<'a> {
    type Item = u128;

    fn next(&mut self) -> Option<u128> {
        if self.remaining == Some(0) {
            return None;
        }
        while let Some(n) = self.next_offset {
            self.next_offset = (n < self.last_offset).then(|| n + 1);
            let addr = self.subnet.ip_min() + n;
            if self.allocated.contains_key(&addr) || self.subnet.is_reserved(addr) {
                continue;
            }
            if let Some(remaining) = self.remaining.as_mut() {
                *remaining -= 1;
            }
            return Some(addr);
        }
        None
    }
}

/// Free addresses of `subnet`, ascending.
///
/// An address is free when it is neither allocated nor reserved. IPv6
/// searches without a count stop after [`IPV6_DEFAULT_COUNT`] results.
/// `first` is applied after the count, so it can shrink the result.
pub fn free_addresses(
    subnet: &Subnet,
    allocated: &AllocatedAddresses,
    request: &AllocationRequest,
) -> Vec<u128> {
    let count = match (request.count, subnet.family()) {
        (Some(count), _) => Some(count),
        (None, Family::V6) => Some(IPV6_DEFAULT_COUNT),
        (None, Family::V4) => None,
    };
    let mut found: Vec<u128> =
        FreeAddresses::new(subnet, allocated, request.search_start, count).collect();
    if let Some(first) = request.first {
        found.retain(|addr| *addr >= first);
    }
    log::debug!(
        "free_addresses({subnet}) count={count:?} first={:?} => {} address(es)",
        request.first,
        found.len()
    );
    found
}

/// Like [`free_addresses`], but fails with [`SubnetError::NoFreeAddress`]
/// when nothing is free.
pub fn find_free_addresses(
    subnet: &Subnet,
    allocated: &AllocatedAddresses,
    request: &AllocationRequest,
) -> Result<Vec<u128>> {
    let found = free_addresses(subnet, allocated, request);
    if found.is_empty() {
        return Err(SubnetError::NoFreeAddress {
            subnet: subnet.to_string(),
            requested: request.count.unwrap_or(1),
            available: 0,
        });
    }
    Ok(found)
}

/// Fetch the allocation snapshot for `subnet` from `inventory` and search it.
pub fn find_free_in_store<I>(
    inventory: &I,
    subnet: &Subnet,
    request: &AllocationRequest,
) -> Result<Vec<u128>>
where
    I: AddressInventory + ?Sized,
{
    let allocated =
        inventory.list_allocated_addresses(subnet.family(), subnet.ip_min(), subnet.ip_max())?;
    find_free_addresses(subnet, &allocated, request)
}

/// Number of allocated addresses within the subnet's range.
pub fn count_used(subnet: &Subnet, allocated: &AllocatedAddresses) -> usize {
    allocated.range(subnet.ip_min()..=subnet.ip_max()).count()
}

/// [`count_used`] against a live inventory.
pub fn count_used_in_store<I>(inventory: &I, subnet: &Subnet) -> Result<usize>
where
    I: AddressInventory + ?Sized,
{
    let allocated =
        inventory.list_allocated_addresses(subnet.family(), subnet.ip_min(), subnet.ip_max())?;
    Ok(count_used(subnet, &allocated))
}

/// Addresses that are neither reserved nor allocated.
pub fn count_unused(subnet: &Subnet, allocated: &AllocatedAddresses) -> u128 {
    let size = subnet.cidr().size();
    let used_unreserved = allocated
        .range(subnet.ip_min()..=subnet.ip_max())
        .filter(|(addr, _)| !subnet.is_reserved(**addr))
        .count() as u128;
    size.saturating_sub(subnet.reserved_addresses().len() as u128)
        .saturating_sub(used_unreserved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{address_to_integer, integer_to_address};

    fn ip(s: &str) -> u128 {
        address_to_integer(s).unwrap()
    }

    fn addresses(found: &[u128], family: Family) -> Vec<String> {
        found.iter().map(|a| integer_to_address(*a, family)).collect()
    }

    #[test]
    fn test_free_addresses_slash30() {
        let subnet = Subnet::create_with_reserved("10.0.0.0/30", "", 0).unwrap();
        let found = free_addresses(&subnet, &AllocatedAddresses::new(), &AllocationRequest::new());
        assert_eq!(addresses(&found, Family::V4), vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn test_free_addresses_skips_allocated_and_reserved() {
        let subnet = Subnet::create_with_reserved("10.0.0.0/28", "", 2).unwrap();
        let mut allocated = AllocatedAddresses::new();
        allocated.insert(ip("10.0.0.3"), 1);
        allocated.insert(ip("10.0.0.5"), 2);
        let found = free_addresses(&subnet, &allocated, &AllocationRequest::new());
        assert_eq!(found.len(), 16 - 4 - 2);
        assert_eq!(found[0], ip("10.0.0.4"));
        assert_eq!(found[1], ip("10.0.0.6"));
        assert_eq!(*found.last().unwrap(), ip("10.0.0.14"));
        assert!(found.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_free_addresses_count_then_first() {
        let subnet = Subnet::create_with_reserved("10.0.0.0/24", "", 0).unwrap();
        let allocated = AllocatedAddresses::new();

        let request = AllocationRequest::new().with_count(3);
        assert_eq!(
            addresses(&free_addresses(&subnet, &allocated, &request), Family::V4),
            vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]
        );

        let request = AllocationRequest::new().with_first(ip("10.0.0.250"));
        assert_eq!(
            addresses(&free_addresses(&subnet, &allocated, &request), Family::V4),
            vec!["10.0.0.250", "10.0.0.251", "10.0.0.252", "10.0.0.253", "10.0.0.254"]
        );

        // first is applied after the count cut-off
        let request = AllocationRequest::new()
            .with_count(3)
            .with_first(ip("10.0.0.2"));
        assert_eq!(
            addresses(&free_addresses(&subnet, &allocated, &request), Family::V4),
            vec!["10.0.0.2", "10.0.0.3"]
        );
    }

    #[test]
    fn test_search_start_only_for_v6() {
        let subnet = Subnet::create_with_reserved("10.0.0.0/29", "", 0).unwrap();
        let request = AllocationRequest::new().starting_at(4).with_count(1);
        let found = free_addresses(&subnet, &AllocatedAddresses::new(), &request);
        assert_eq!(found, vec![ip("10.0.0.1")]);

        let subnet = Subnet::create_with_reserved("2001:db8::/64", "", 2).unwrap();
        let found = free_addresses(&subnet, &AllocatedAddresses::new(), &request);
        assert_eq!(found, vec![subnet.ip_min() + 4]);
    }

    #[test]
    fn test_v6_default_count() {
        let subnet = Subnet::create_with_reserved("2001:db8::/64", "", 10).unwrap();
        let found = free_addresses(&subnet, &AllocatedAddresses::new(), &AllocationRequest::new());
        assert_eq!(found.len(), IPV6_DEFAULT_COUNT);
        assert_eq!(found[0], subnet.ip_min() + 10);
    }

    #[test]
    fn test_v6_search_past_end() {
        let subnet = Subnet::create_with_reserved("2001:db8::/126", "", 0).unwrap();
        let request = AllocationRequest::new().starting_at(3);
        assert_eq!(
            free_addresses(&subnet, &AllocatedAddresses::new(), &request),
            vec![subnet.ip_max()]
        );
        let request = AllocationRequest::new().starting_at(4);
        assert!(free_addresses(&subnet, &AllocatedAddresses::new(), &request).is_empty());
    }

    #[test]
    fn test_v6_whole_space_is_bounded() {
        let subnet = Subnet::create_with_reserved("::/0", "", 0).unwrap();
        let request = AllocationRequest::new().starting_at(u128::MAX - 1);
        assert_eq!(
            free_addresses(&subnet, &AllocatedAddresses::new(), &request),
            vec![u128::MAX - 1, u128::MAX]
        );
    }

    #[test]
    fn test_iterator_is_lazy_and_restartable() {
        let subnet = Subnet::create_with_reserved("10.0.0.0/8", "", 0).unwrap();
        let allocated = AllocatedAddresses::new();
        let mut iter = FreeAddresses::new(&subnet, &allocated, 0, None);
        assert_eq!(iter.next(), Some(ip("10.0.0.1")));
        assert_eq!(iter.next(), Some(ip("10.0.0.2")));
        let again: Vec<u128> = FreeAddresses::new(&subnet, &allocated, 0, Some(1)).collect();
        assert_eq!(again, vec![ip("10.0.0.1")]);
    }

    #[test]
    fn test_find_free_addresses_none_left() {
        let subnet = Subnet::create_with_reserved("10.0.0.0/31", "", 0).unwrap();
        let err = find_free_addresses(&subnet, &AllocatedAddresses::new(), &AllocationRequest::new())
            .unwrap_err();
        assert!(matches!(err, SubnetError::NoFreeAddress { available: 0, .. }));
    }

    #[test]
    fn test_count_used_and_unused() {
        let subnet = Subnet::create_with_reserved("10.0.0.0/28", "", 2).unwrap();
        let mut allocated = AllocatedAddresses::new();
        allocated.insert(ip("10.0.0.1"), 1); // reserved but allocated
        allocated.insert(ip("10.0.0.7"), 2);
        allocated.insert(ip("10.0.1.7"), 3); // outside
        assert_eq!(count_used(&subnet, &allocated), 2);
        assert_eq!(count_unused(&subnet, &allocated), 16 - 4 - 1);
    }
}

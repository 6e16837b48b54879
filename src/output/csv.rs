//! CSV output formatting for the subnet inventory.

use crate::models::{integer_to_address, Subnet, SubnetId};
use crate::processing::{count_unused, count_used, find_overlapping_records};
use crate::store::{AddressInventory, SubnetStore};
use colored::Colorize;
use std::collections::HashSet;
use std::error::Error;

use super::terminal::format_field;

/// One printed line of the inventory summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetPrintRow {
    pub cnt: usize,
    pub entity_id: String,
    pub subnet_cidr: String,
    pub ip_max: String,
    /// `used/free` addresses.
    pub usage: String,
    pub reserved: u32,
    pub vlan: String,
    pub delegated: bool,
    pub name_prefix: String,
    pub description: String,
    /// The subnet overlaps another one in the inventory.
    pub overlap: bool,
}

/// Build the summary rows for every subnet in the store, ordered by family
/// and address.
pub fn subnet_rows<S>(store: &S) -> Result<Vec<SubnetPrintRow>, Box<dyn Error>>
where
    S: SubnetStore + AddressInventory + ?Sized,
{
    let mut records = store.list_subnets()?;
    records.sort_by_key(|r| (r.subnet.family, r.subnet.network, r.subnet.prefix));

    let overlapping: HashSet<Option<SubnetId>> = find_overlapping_records(&records)
        .into_iter()
        .flat_map(|c| [c.first.0, c.second.0])
        .collect();

    let mut rows = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let subnet = Subnet::from_record(record)?;
        let allocated =
            store.list_allocated_addresses(subnet.family(), subnet.ip_min(), subnet.ip_max())?;
        rows.push(SubnetPrintRow {
            cnt: i + 1,
            entity_id: record
                .entity_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            subnet_cidr: subnet.to_string(),
            ip_max: integer_to_address(subnet.ip_max(), subnet.family()),
            usage: format!(
                "{}/{}",
                count_used(&subnet, &allocated),
                count_unused(&subnet, &allocated)
            ),
            reserved: subnet.reserved_count(),
            vlan: subnet
                .vlan_number
                .map(|v| v.to_string())
                .unwrap_or_default(),
            delegated: subnet.dns_delegated,
            name_prefix: subnet.name_prefix.clone().unwrap_or_default(),
            description: subnet.description.clone(),
            overlap: overlapping.contains(&record.entity_id),
        });
    }
    Ok(rows)
}

/// Print the subnet inventory as CSV to stdout.
pub fn subnet_print<S>(store: &S) -> Result<(), Box<dyn Error>>
where
    S: SubnetStore + AddressInventory + ?Sized,
{
    let rows = subnet_rows(store)?;
    log::info!("#Start subnet_print() subnet count = {}", rows.len());

    // Print CSV header
    println!(
        r#" "cnt",  "id",                                   "subnet_cidr",                                  "ip_max", "used/free",  "rsv", "vlan", "dns_del", "name_prefix",        "description""#
    );

    for row in &rows {
        print_csv_row(row);
    }

    let overlaps = rows.iter().filter(|r| r.overlap).count();
    if overlaps > 0 {
        println!(
            "#{}# {overlaps} subnet(s) overlap another subnet",
            "NOTE".on_red()
        );
    }
    Ok(())
}

/// Print a single CSV row.
fn print_csv_row(row: &SubnetPrintRow) {
    let subnet_cidr = format_field(&row.subnet_cidr, 46);
    let subnet_cidr = if row.overlap {
        subnet_cidr.red().to_string()
    } else {
        subnet_cidr
    };
    println!(
        r#"{cnt},{id},{subnet_cidr},{ip_max},{usage},{reserved},{vlan},{delegated},{name_prefix},{description}"#,
        cnt = format_field(row.cnt, 6),
        id = format_field(&row.entity_id, 6),
        ip_max = format_field(&row.ip_max, 41),
        usage = format_field(&row.usage, 12),
        reserved = format_field(row.reserved, 6),
        vlan = format_field(&row.vlan, 7),
        delegated = format_field(row.delegated, 10),
        name_prefix = format_field(&row.name_prefix, 14),
        description = format_field(&row.description, 24),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::read_inventory;

    #[test]
    fn test_subnet_rows_01() {
        let store = read_inventory("src/tests/test_data/inventory_01.json")
            .expect("Error reading inventory");
        let rows = subnet_rows(&store).expect("Error building rows");

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].subnet_cidr, "10.10.0.0/23");
        assert_eq!(rows[1].subnet_cidr, "129.240.2.0/24");
        assert_eq!(rows[1].ip_max, "129.240.2.255");
        assert_eq!(rows[1].usage, "3/242");
        assert_eq!(rows[1].vlan, "402");
        assert!(rows[2].subnet_cidr.starts_with("2001:0700:0100:0001"));
        assert!(rows.iter().all(|r| !r.overlap));
        assert_eq!(rows.iter().map(|r| r.cnt).collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}

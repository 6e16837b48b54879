//! DNS subnet address allocator.
//!
//! Keeps an inventory of IPv4 and IPv6 subnets, each with a set of reserved
//! addresses, and finds free addresses in them for new host records.
//!
//! - [`models`] - Address arithmetic, CIDR and the subnet entity
//! - [`validate`] - Address and subnet syntax checks
//! - [`store`] - Persistence seam and the JSON inventory store
//! - [`processing`] - Overlaps, free addresses, lookup and admin updates
//! - [`output`] - CSV and terminal reports

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod processing;
pub mod store;
pub mod validate;

use config::Config;
use std::error::Error;
use store::MemoryStore;

pub use error::{Result, StoreError, SubnetError};
pub use processing::check_for_duplicate_subnets;
pub use validate::validate_cidr;

/// Load the inventory file named by `inventory_file`, or the configured one.
///
/// # Arguments
/// * `inventory_file` - Optional path overriding `config.inventory_file`
/// * `config` - Runtime configuration
///
/// # Returns
/// * `Ok(MemoryStore)` - The loaded inventory
/// * `Err` - If the file is missing or invalid
pub fn load_inventory(
    inventory_file: Option<&str>,
    config: &Config,
) -> std::result::Result<MemoryStore, Box<dyn Error>> {
    let path = inventory_file.unwrap_or(&config.inventory_file);
    let store = store::read_inventory(path)?;
    if let Some(updated_at) = store.updated_at() {
        log::info!("Inventory {path} last written {updated_at}");
    }
    Ok(store)
}

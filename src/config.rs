//! Runtime configuration read from the environment (and `.env` via dotenv).

use crate::models::ReservedPolicy;
use crate::processing::IPV6_DEFAULT_COUNT;
use std::error::Error;

/// Inventory file used when `SUBNET_INVENTORY_FILE` is not set.
pub const DEFAULT_INVENTORY_FILE: &str = "subnet_inventory.json";

pub const ENV_INVENTORY_FILE: &str = "SUBNET_INVENTORY_FILE";
pub const ENV_RESERVED_V4: &str = "SUBNET_RESERVED_BY_NET_SIZE";
pub const ENV_RESERVED_V6: &str = "SUBNET6_RESERVED_BY_NET_SIZE";
pub const ENV_V6_DEFAULT_SCAN: &str = "SUBNET6_DEFAULT_SCAN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub inventory_file: String,
    pub reserved_v4: ReservedPolicy,
    pub reserved_v6: ReservedPolicy,
    /// Free IPv6 addresses listed when no count is given.
    pub ipv6_default_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            inventory_file: DEFAULT_INVENTORY_FILE.to_string(),
            reserved_v4: ReservedPolicy::default_v4(),
            reserved_v6: ReservedPolicy::default_v6(),
            ipv6_default_count: IPV6_DEFAULT_COUNT,
        }
    }
}

impl Config {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Config, Box<dyn Error>> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from `lookup`; unset keys keep their default.
    ///
    /// # Arguments
    /// * `lookup` - Returns the value of a variable, or None when unset
    ///
    /// # Returns
    /// * `Err` - If a reserved table or the scan count does not parse
    pub fn from_lookup<F>(lookup: F) -> Result<Config, Box<dyn Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        if let Some(file) = lookup(ENV_INVENTORY_FILE) {
            config.inventory_file = file;
        }
        if let Some(table) = lookup(ENV_RESERVED_V4) {
            config.reserved_v4 =
                ReservedPolicy::parse(&table).map_err(|e| format!("{ENV_RESERVED_V4}: {e}"))?;
        }
        if let Some(table) = lookup(ENV_RESERVED_V6) {
            config.reserved_v6 =
                ReservedPolicy::parse(&table).map_err(|e| format!("{ENV_RESERVED_V6}: {e}"))?;
        }
        if let Some(count) = lookup(ENV_V6_DEFAULT_SCAN) {
            config.ipv6_default_count = count
                .trim()
                .parse()
                .map_err(|e| format!("{ENV_V6_DEFAULT_SCAN}={count}: {e}"))?;
        }
        log::debug!("Config: {config:?}");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.inventory_file, "subnet_inventory.json");
        assert_eq!(config.ipv6_default_count, 100);
        assert_eq!(config.reserved_v4.reserved_for(24), 9);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("SUBNET_INVENTORY_FILE", "other.json"),
            ("SUBNET_RESERVED_BY_NET_SIZE", "24:3, 30:0"),
            ("SUBNET6_DEFAULT_SCAN", "5"),
        ]))
        .unwrap();
        assert_eq!(config.inventory_file, "other.json");
        assert_eq!(config.reserved_v4.reserved_for(24), 3);
        assert_eq!(config.reserved_v6, ReservedPolicy::default_v6());
        assert_eq!(config.ipv6_default_count, 5);
    }

    #[test]
    fn test_bad_values() {
        assert!(Config::from_lookup(lookup(&[("SUBNET6_DEFAULT_SCAN", "many")])).is_err());
        let err = Config::from_lookup(lookup(&[("SUBNET6_RESERVED_BY_NET_SIZE", "64=1")]))
            .unwrap_err();
        assert!(err.to_string().contains("SUBNET6_RESERVED_BY_NET_SIZE"));
    }
}

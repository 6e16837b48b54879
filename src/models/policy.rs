//! Default number of reserved addresses per subnet size.

use std::collections::BTreeMap;
use std::error::Error;

/// Maps a prefix length to the number of addresses reserved at the start of
/// a new subnet of that size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedPolicy {
    by_prefix: BTreeMap<u8, u32>,
}

impl ReservedPolicy {
    /// Create a policy from `(prefix, reserved_count)` pairs.
    pub fn new<I: IntoIterator<Item = (u8, u32)>>(entries: I) -> ReservedPolicy {
        ReservedPolicy {
            by_prefix: entries.into_iter().collect(),
        }
    }

    /// Default IPv4 table.
    pub fn default_v4() -> ReservedPolicy {
        ReservedPolicy::new([
            (22, 9),
            (23, 9),
            (24, 9),
            (25, 5),
            (26, 3),
            (27, 3),
            (28, 2),
            (29, 1),
            (30, 0),
            (31, 0),
            (32, 0),
        ])
    }

    /// Default IPv6 table.
    pub fn default_v6() -> ReservedPolicy {
        ReservedPolicy::new([(48, 100), (56, 100), (64, 100), (127, 0), (128, 0)])
    }

    /// Parse a table written as `"24:9,25:5,30:0"`.
    pub fn parse(table: &str) -> Result<ReservedPolicy, Box<dyn Error>> {
        let mut by_prefix = BTreeMap::new();
        for entry in table.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (prefix, count) = entry
                .split_once(':')
                .ok_or_else(|| format!("Invalid reserved policy entry '{entry}'"))?;
            let prefix: u8 = prefix
                .trim()
                .parse()
                .map_err(|e| format!("Invalid prefix in '{entry}': {e}"))?;
            let count: u32 = count
                .trim()
                .parse()
                .map_err(|e| format!("Invalid reserved count in '{entry}': {e}"))?;
            by_prefix.insert(prefix, count);
        }
        if by_prefix.is_empty() {
            return Err(format!("Reserved policy table '{table}' is empty").into());
        }
        Ok(ReservedPolicy { by_prefix })
    }

    /// Reserved count for `prefix`; prefixes missing from the table get the
    /// largest count in the table.
    pub fn reserved_for(&self, prefix: u8) -> u32 {
        self.by_prefix
            .get(&prefix)
            .copied()
            .unwrap_or_else(|| self.by_prefix.values().copied().max().unwrap_or(0))
    }
}

//! Error types for subnet and address handling.
//!
//! Every failure is local to the requested operation: the caller gets a
//! [`SubnetError`] with enough structured data to build a message, and no
//! in-memory state has been changed.

use crate::models::SubnetRange;
use itertools::Itertools;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, SubnetError>;

/// Failure reported by the external subnet store or address inventory.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("store error: {0}")]
pub struct StoreError(pub String);

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SubnetError {
    /// Malformed address or CIDR string.
    #[error("Invalid address or subnet '{input}': {reason}")]
    Format { input: String, reason: String },

    /// The reserved count does not fit in the subnet.
    #[error(
        "Trying to reserve {requested} addresses in a subnet that has {available} addresses available"
    )]
    Policy { requested: u32, available: u128 },

    #[error(
        "Subnet '{subnet}' overlaps with the following subnet(s): '{}'",
        .conflicts.iter().join("', '")
    )]
    Overlap {
        subnet: String,
        conflicts: Vec<SubnetRange>,
    },

    #[error(
        "The following reserved ip's are already in use on (new?) subnet {subnet}: '{}'",
        .addresses.join(", ")
    )]
    ReservedInUse {
        subnet: String,
        addresses: Vec<String>,
    },

    #[error("Subnet '{subnet}' has {} address(es) in use: '{}'", .addresses.len(), .addresses.join(", "))]
    AddressesInUse {
        subnet: String,
        addresses: Vec<String>,
    },

    #[error("No available ip on subnet {subnet} (requested {requested}, found {available})")]
    NoFreeAddress {
        subnet: String,
        requested: usize,
        available: usize,
    },

    #[error("Unable to find subnet identified by '{identifier}'")]
    NotFound { identifier: String },

    /// Lifecycle transition not allowed from the current state.
    #[error("Cannot {operation} subnet {subnet} in state {state}")]
    State {
        subnet: String,
        operation: &'static str,
        state: &'static str,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SubnetError {
    pub(crate) fn format(input: &str, reason: impl Into<String>) -> SubnetError {
        SubnetError::Format {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

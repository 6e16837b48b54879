//! Finding a stored subnet from user input.

use crate::error::{Result, SubnetError};
use crate::models::{address_to_integer_for, Family, Subnet, SubnetId};
use crate::store::SubnetStore;
use regex::Regex;
use std::sync::OnceLock;

static ENTITY_ID_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_entity_id_regex() -> &'static Regex {
    ENTITY_ID_REGEX
        .get_or_init(|| Regex::new(r"^(?:id|entity_id):(.*)$").expect("Invalid Regex"))
}

/// The ways a user can name a subnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubnetIdentifier {
    /// `id:42` or `entity_id:42`.
    EntityId(SubnetId),
    /// `10.0.1.0/24` or `10.0.1/24`; only the network address is compared.
    Network { family: Family, addr: u128 },
    /// A bare address; matches the subnet containing it.
    Address { family: Family, addr: u128 },
}

impl SubnetIdentifier {
    pub fn parse(identifier: &str) -> Result<SubnetIdentifier> {
        let identifier = identifier.trim();
        if let Some(caps) = get_entity_id_regex().captures(identifier) {
            let id = caps[1].trim().parse().map_err(|_| {
                SubnetError::format(identifier, "Entity ID must be an integer")
            })?;
            return Ok(SubnetIdentifier::EntityId(id));
        }
        match identifier.split_once('/') {
            Some((ip, _)) => {
                let (family, addr) = parse_address(ip)?;
                Ok(SubnetIdentifier::Network { family, addr })
            }
            None => {
                let (family, addr) = parse_address(identifier)?;
                Ok(SubnetIdentifier::Address { family, addr })
            }
        }
    }
}

/// Parse an address, accepting the three-octet IPv4 shorthand.
fn parse_address(ip: &str) -> Result<(Family, u128)> {
    let family = Family::of(ip);
    let ip = if family == Family::V4 && ip.split('.').count() == 3 {
        format!("{ip}.0")
    } else {
        ip.to_string()
    };
    Ok((family, address_to_integer_for(&ip, family)?))
}

/// Look up a stored subnet by entity id, subnet address or contained address.
///
/// # Arguments
/// * `store` - Where the subnets live
/// * `identifier` - e.g. `id:12`, `129.240.2.0/24`, `129.240.2.17`
///
/// # Returns
/// * `Ok(Subnet)` - The stored subnet
/// * `Err(SubnetError::NotFound)` - If no subnet matches
pub fn find_subnet<S>(store: &S, identifier: &str) -> Result<Subnet>
where
    S: SubnetStore + ?Sized,
{
    let wanted = SubnetIdentifier::parse(identifier)?;
    let record = store.list_subnets()?.into_iter().find(|r| match wanted {
        SubnetIdentifier::EntityId(id) => r.entity_id == Some(id),
        SubnetIdentifier::Network { family, addr } => {
            r.subnet.family == family && r.subnet.network == addr
        }
        SubnetIdentifier::Address { family, addr } => {
            r.subnet.family == family && r.subnet.contains(addr)
        }
    });
    match record {
        Some(record) => {
            log::debug!("find_subnet({identifier}) => {}", record.subnet);
            Subnet::from_record(&record)
        }
        None => Err(SubnetError::NotFound {
            identifier: identifier.to_string(),
        }),
    }
}

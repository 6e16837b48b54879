//! Command line handling for the `dns-subnet-allocator` binary.
//!
//! Arguments are positional:
//!
//! ```text
//! dns-subnet-allocator                               # inventory summary
//! dns-subnet-allocator info <subnet>
//! dns-subnet-allocator free <subnet> [count] [--from <address>]
//! dns-subnet-allocator create <cidr> [description] [--vlan N] [--no-checks]
//! dns-subnet-allocator delete <subnet> [--force]
//! dns-subnet-allocator set-reserved <subnet> <count>
//! dns-subnet-allocator set-vlan <subnet> <vlan>
//! dns-subnet-allocator set-name-prefix <subnet> <prefix>
//! dns-subnet-allocator set-dns-delegated <subnet> [--force]
//! dns-subnet-allocator unset-dns-delegated <subnet>
//! ```
//!
//! `<subnet>` is anything [`SubnetIdentifier`] accepts.
//!
//! [`SubnetIdentifier`]: crate::processing::SubnetIdentifier

use crate::config::Config;
use crate::models::{address_to_integer_for, integer_to_address, Family, Subnet};
use crate::output::{print_subnet_info, subnet_print};
use crate::processing::{
    self, check_for_duplicate_subnets, find_free_in_store, find_overlapping_records, find_subnet,
    log_overlapping_subnets, AllocationRequest, SubnetInfo,
};
use crate::store::{AddressInventory, MemoryStore, SubnetStore};
use colored::Colorize;
use std::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Summary,
    Info {
        subnet: String,
    },
    Free {
        subnet: String,
        count: Option<usize>,
        /// Resume the listing at this address.
        from: Option<String>,
    },
    Create {
        cidr: String,
        description: String,
        vlan: Option<u32>,
        perform_checks: bool,
    },
    Delete {
        subnet: String,
        force: bool,
    },
    SetReserved {
        subnet: String,
        count: u32,
    },
    SetVlan {
        subnet: String,
        vlan: u32,
    },
    SetNamePrefix {
        subnet: String,
        name_prefix: String,
    },
    SetDnsDelegated {
        subnet: String,
        force: bool,
    },
    UnsetDnsDelegated {
        subnet: String,
    },
}

/// What a command did, for the caller to print and persist.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    pub messages: Vec<String>,
    /// The store changed and the inventory file should be rewritten.
    pub modified: bool,
}

impl Outcome {
    fn message(message: String, modified: bool) -> Outcome {
        Outcome {
            messages: vec![message],
            modified,
        }
    }
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|a| a != flag);
    args.len() != before
}

fn take_option(args: &mut Vec<String>, option: &str) -> Result<Option<String>, Box<dyn Error>> {
    match args.iter().position(|a| a == option) {
        None => Ok(None),
        Some(i) if i + 1 < args.len() => {
            let value = args.remove(i + 1);
            args.remove(i);
            Ok(Some(value))
        }
        Some(_) => Err(format!("Missing value for {option}").into()),
    }
}

/// Flags and options each command accepts.
fn accepted_options(command: &str) -> &'static [&'static str] {
    match command {
        "free" => &["--from"],
        "create" => &["--vlan", "--no-checks"],
        "delete" | "set-dns-delegated" => &["--force"],
        _ => &[],
    }
}

fn arg(args: &[String], i: usize, name: &str) -> Result<String, Box<dyn Error>> {
    args.get(i)
        .cloned()
        .ok_or_else(|| format!("Missing argument <{name}>").into())
}

fn number<T: std::str::FromStr>(value: &str, name: &str) -> Result<T, Box<dyn Error>>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| format!("Invalid {name} '{value}': {e}").into())
}

impl Command {
    /// Parse the arguments after the program name.
    pub fn parse(args: &[String]) -> Result<Command, Box<dyn Error>> {
        let mut args = args.to_vec();
        let force = take_flag(&mut args, "--force");
        let no_checks = take_flag(&mut args, "--no-checks");
        let vlan = take_option(&mut args, "--vlan")?;
        let from = take_option(&mut args, "--from")?;

        let name = args.first().map(String::as_str).unwrap_or_default();
        let given = [
            ("--force", force),
            ("--no-checks", no_checks),
            ("--vlan", vlan.is_some()),
            ("--from", from.is_some()),
        ];
        for (option, _) in given.iter().filter(|(_, present)| *present) {
            if !accepted_options(name).contains(option) {
                return Err(format!("Option {option} is not valid for command '{name}'").into());
            }
        }

        let command = match args.first().map(String::as_str) {
            None => Command::Summary,
            Some("info") => Command::Info {
                subnet: arg(&args, 1, "subnet")?,
            },
            Some("free") => Command::Free {
                subnet: arg(&args, 1, "subnet")?,
                count: args.get(2).map(|c| number(c, "count")).transpose()?,
                from,
            },
            Some("create") => Command::Create {
                cidr: arg(&args, 1, "cidr")?,
                description: args.get(2).cloned().unwrap_or_default(),
                vlan: vlan.as_deref().map(|v| number(v, "vlan")).transpose()?,
                perform_checks: !no_checks,
            },
            Some("delete") => Command::Delete {
                subnet: arg(&args, 1, "subnet")?,
                force,
            },
            Some("set-reserved") => Command::SetReserved {
                subnet: arg(&args, 1, "subnet")?,
                count: number(&arg(&args, 2, "count")?, "reserved count")?,
            },
            Some("set-vlan") => Command::SetVlan {
                subnet: arg(&args, 1, "subnet")?,
                vlan: number(&arg(&args, 2, "vlan")?, "vlan")?,
            },
            Some("set-name-prefix") => Command::SetNamePrefix {
                subnet: arg(&args, 1, "subnet")?,
                name_prefix: arg(&args, 2, "prefix")?,
            },
            Some("set-dns-delegated") => Command::SetDnsDelegated {
                subnet: arg(&args, 1, "subnet")?,
                force,
            },
            Some("unset-dns-delegated") => Command::UnsetDnsDelegated {
                subnet: arg(&args, 1, "subnet")?,
            },
            Some(other) => return Err(format!("Unknown command '{other}'").into()),
        };
        log::debug!("Command::parse({args:?}) => {command:?}");
        Ok(command)
    }

    /// Run the command against `store`.
    ///
    /// Reports are printed to stdout; confirmation messages are returned in
    /// the [`Outcome`].
    pub fn execute(self, store: &mut MemoryStore, config: &Config) -> Result<Outcome, Box<dyn Error>> {
        log::info!("#Start execute({})", format!("{self:?}").on_blue());
        let outcome = match self {
            Command::Summary => {
                let records = store.list_subnets()?;
                check_for_duplicate_subnets(&records)?;
                log_overlapping_subnets(&find_overlapping_records(&records));
                subnet_print(&*store)?;
                Outcome::default()
            }
            Command::Info { subnet } => {
                let subnet = find_subnet(&*store, &subnet)?;
                let allocated = store.list_allocated_addresses(
                    subnet.family(),
                    subnet.ip_min(),
                    subnet.ip_max(),
                )?;
                print_subnet_info(&SubnetInfo::build(&subnet, &allocated));
                Outcome::default()
            }
            Command::Free {
                subnet,
                count,
                from,
            } => {
                let subnet = find_subnet(&*store, &subnet)?;
                let family = subnet.family();
                let count = match (count, family) {
                    (None, Family::V6) => Some(config.ipv6_default_count),
                    (count, _) => count,
                };
                let mut request = AllocationRequest {
                    count,
                    ..AllocationRequest::new()
                };
                if let Some(from) = from {
                    let first = address_to_integer_for(&from, family)?;
                    if !subnet.contains(first) {
                        return Err(format!("Address {from} is not in subnet {subnet}").into());
                    }
                    request = request.with_first(first);
                    request = match family {
                        Family::V6 => request.starting_at(first - subnet.ip_min()),
                        // IPv4 always scans from the network address, so
                        // the count is applied after the `first` filter here
                        Family::V4 => AllocationRequest {
                            count: None,
                            ..request
                        },
                    };
                }
                let mut found = find_free_in_store(&*store, &subnet, &request)?;
                if let Some(count) = count {
                    found.truncate(count);
                }
                Outcome {
                    messages: found
                        .iter()
                        .map(|a| integer_to_address(*a, subnet.family()))
                        .collect(),
                    modified: false,
                }
            }
            Command::Create {
                cidr,
                description,
                vlan,
                perform_checks,
            } => {
                let policy = match Family::of(&cidr) {
                    Family::V4 => &config.reserved_v4,
                    Family::V6 => &config.reserved_v6,
                };
                let mut subnet = Subnet::create(&cidr, &description, policy)?;
                if let Some(vlan) = vlan {
                    subnet = subnet.with_vlan(vlan);
                }
                let entity_id = subnet.commit(store, perform_checks)?;
                Outcome::message(
                    format!(
                        "Subnet {subnet} created with entity_id={entity_id}, {} reserved address(es)",
                        subnet.reserved_count()
                    ),
                    true,
                )
            }
            Command::Delete { subnet, force } => {
                let mut subnet = find_subnet(&*store, &subnet)?;
                subnet.delete(store, force)?;
                Outcome::message(format!("Subnet {subnet} deleted"), true)
            }
            Command::SetReserved { subnet, count } => {
                let mut subnet = find_subnet(&*store, &subnet)?;
                let note = processing::set_reserved(store, &mut subnet, count)?;
                let mut outcome = Outcome::message(
                    format!("OK; Number of reserved addresses for subnet {subnet} set to {count}"),
                    true,
                );
                outcome.messages.extend(note);
                outcome
            }
            Command::SetVlan { subnet, vlan } => {
                let mut subnet = find_subnet(&*store, &subnet)?;
                Outcome::message(processing::set_vlan(store, &mut subnet, vlan)?, true)
            }
            Command::SetNamePrefix {
                subnet,
                name_prefix,
            } => {
                let mut subnet = find_subnet(&*store, &subnet)?;
                Outcome::message(
                    processing::set_name_prefix(store, &mut subnet, &name_prefix)?,
                    true,
                )
            }
            Command::SetDnsDelegated { subnet, force } => {
                let mut subnet = find_subnet(&*store, &subnet)?;
                let was = subnet.dns_delegated;
                let message = processing::set_dns_delegated(store, &mut subnet, force)?;
                Outcome::message(message, !was)
            }
            Command::UnsetDnsDelegated { subnet } => {
                let mut subnet = find_subnet(&*store, &subnet)?;
                let was = subnet.dns_delegated;
                let message = processing::unset_dns_delegated(store, &mut subnet)?;
                Outcome::message(message, was)
            }
        };
        Ok(outcome)
    }
}

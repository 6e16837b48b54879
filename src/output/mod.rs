//! Output formatting for subnet data.
//!
//! This module handles formatting and outputting subnet data:
//! - [`csv`] - CSV summary of the inventory
//! - [`terminal`] - Field formatting and per-subnet reports

mod csv;
mod terminal;

pub use csv::{subnet_print, subnet_rows, SubnetPrintRow};
pub use terminal::{format_field, print_subnet_info, subnet_info_lines};

//! Overlapping subnet detection.
//!
//! New subnets are checked through [`Subnet::validate_no_overlap`]; the
//! functions here audit a whole inventory, e.g. one loaded from a file that
//! never went through the store.
//!
//! [`Subnet::validate_no_overlap`]: crate::models::Subnet::validate_no_overlap

use crate::models::{SubnetId, SubnetRange, SubnetRecord};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::error::Error;

/// Two stored subnets whose ranges intersect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapConflict {
    pub first: (Option<SubnetId>, SubnetRange),
    pub second: (Option<SubnetId>, SubnetRange),
}

/// Symmetric range intersection test.
pub fn overlaps(a: &SubnetRange, b: &SubnetRange) -> bool {
    a.overlaps(b)
}

/// Every range in `existing` that intersects `range`.
pub fn find_overlaps(range: &SubnetRange, existing: &[SubnetRange]) -> Vec<SubnetRange> {
    existing
        .iter()
        .filter(|other| overlaps(range, other))
        .cloned()
        .collect()
}

/// Find every pair of records whose ranges intersect.
///
/// # Arguments
/// * `records` - The subnets to audit, any order
///
/// # Returns
/// The conflicting pairs, ordered by the lower address of the first subnet;
/// the containing subnet comes first when both start at the same address
pub fn find_overlapping_records(records: &[SubnetRecord]) -> Vec<OverlapConflict> {
    let mut sorted: Vec<(Option<SubnetId>, SubnetRange)> = records
        .iter()
        .map(|r| (r.entity_id, SubnetRange::from(r)))
        .collect();
    // containing subnet first when two start at the same address
    sorted.sort_by_key(|(_, range)| (range.family, range.ip_min, Reverse(range.ip_max)));

    let mut conflicts = Vec::new();
    for (i, (id, range)) in sorted.iter().enumerate() {
        // sorted by ip_min, so later entries can only overlap while they start
        // inside this range
        for (other_id, other) in sorted.iter().skip(i + 1) {
            if other.family != range.family || other.ip_min > range.ip_max {
                break;
            }
            conflicts.push(OverlapConflict {
                first: (*id, range.clone()),
                second: (*other_id, other.clone()),
            });
        }
    }
    conflicts
}

/// Log overlapping subnet conflicts as warnings.
pub fn log_overlapping_subnets(conflicts: &[OverlapConflict]) {
    if conflicts.is_empty() {
        log::info!("No overlapping subnets found.");
        return;
    }

    log::warn!("Found {} overlapping subnet pair(s):", conflicts.len());
    for conflict in conflicts {
        log::warn!(
            "  {} (entity_id={:?}) overlaps {} (entity_id={:?})",
            conflict.first.1,
            conflict.first.0,
            conflict.second.1,
            conflict.second.0
        );
    }
}

/// Return an error if the same subnet or entity id appears more than once.
pub fn check_for_duplicate_subnets(records: &[SubnetRecord]) -> Result<(), Box<dyn Error>> {
    let mut seen = HashSet::new();
    let mut seen_ids = HashSet::new();

    for record in records {
        if !seen.insert(record.subnet) {
            return Err(format!("Duplicate found: {:?}", record).into());
        }
        if let Some(id) = record.entity_id {
            if !seen_ids.insert(id) {
                return Err(format!("Duplicate entity_id {id}: {:?}", record).into());
            }
        }
    }
    Ok(())
}

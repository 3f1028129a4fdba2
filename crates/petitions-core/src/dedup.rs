//! Merge petitions discovered across search terms and pick the ones worth
//! classifying and breaking down by constituency.

use std::collections::HashSet;

use tracing::info;

use crate::petition::Petition;

/// Petitions need strictly more signatures than this to qualify.
pub const DEFAULT_THRESHOLD: u64 = 1000;

/// Keep the first occurrence of each petition id, in discovery order.
pub fn dedup_by_id(petitions: Vec<Petition>) -> Vec<Petition> {
    let total = petitions.len();
    let mut seen = HashSet::with_capacity(total);
    let unique: Vec<Petition> = petitions
        .into_iter()
        .filter(|p| seen.insert(p.id))
        .collect();
    info!(
        discovered = total,
        unique = unique.len(),
        "deduplicated petitions"
    );
    unique
}

/// Petitions with `signature_count > threshold`, most signed first.
///
/// The sort is stable, so petitions with equal counts keep discovery order.
pub fn qualifying(petitions: &[Petition], threshold: u64) -> Vec<Petition> {
    let mut selected: Vec<Petition> = petitions
        .iter()
        .filter(|p| p.signature_count > threshold)
        .cloned()
        .collect();
    selected.sort_by(|a, b| b.signature_count.cmp(&a.signature_count));
    selected
}

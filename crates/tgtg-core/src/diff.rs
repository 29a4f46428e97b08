//! Detect items that went from sold out to available between two polls.

use crate::items::{ItemRecord, Snapshot};

/// Returns the current record of every item that had zero bags in
/// `previous` and has at least one in `current`.
///
/// Only ids already known to `previous` are considered: an item seen for the
/// first time is never reported, even if it is available. Items missing from
/// `current` are skipped. Output follows the iteration order of `previous`.
#[must_use]
pub fn newly_available(previous: &Snapshot, current: &Snapshot) -> Vec<ItemRecord> {
    previous
        .iter()
        .filter(|(_, before)| before.items_available == 0)
        .filter_map(|(id, _)| current.get(id))
        .filter(|after| after.items_available > 0)
        .cloned()
        .collect()
}

//! Collapse a discovery response into a [`Snapshot`].

use crate::items::Snapshot;
use crate::payload::DiscoverResults;

/// Collects every item from the `ITEM` buckets of `results`, deduplicated by
/// item id.
///
/// When the same id appears more than once, the first occurrence in bucket
/// order (then array order within a bucket) wins. Non-`ITEM` buckets
/// contribute nothing.
#[must_use]
pub fn aggregate(results: &DiscoverResults) -> Snapshot {
    results
        .buckets
        .iter()
        .flat_map(|bucket| bucket.items().iter().cloned())
        .collect()
}

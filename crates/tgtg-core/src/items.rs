//! Item records as reported by the discovery API, and the [`Snapshot`] map
//! that keys them by item id.
//!
//! ## Observed shape
//!
//! Each entry in an `ITEM` bucket nests the sellable unit under `item` and the
//! seller under `store`. Only the fields the watcher reads are modelled here;
//! everything else in the upstream entry is dropped on ingest, so the
//! persisted snapshot carries exactly these fields.
//!
//! ### `items_available`
//! Integer count of bags left. `0` means sold out. Modelled as `i64` so a
//! negative value from upstream parses and is simply treated as unavailable.
//!
//! ### `average_overall_rating`
//! Absent for stores without enough ratings.
//!
//! ### `pickup_interval`
//! Absent for items that are sold out for the day. Timestamps are ISO-8601
//! with an explicit offset (usually `Z`).

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One sellable unit at one store at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub item: ItemDetails,
    pub store: Store,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_interval: Option<Interval>,
    #[serde(default)]
    pub items_available: i64,
}

impl ItemRecord {
    /// Stable upstream identifier, unique within a snapshot.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.item.item_id
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.items_available > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDetails {
    pub item_id: String,
    #[serde(default)]
    pub name: String,
    pub item_price: Price,
    #[serde(default)]
    pub cover_picture: Picture,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_overall_rating: Option<Rating>,
}

/// Monetary amount in minor units, e.g. `{minor_units: 1050, decimals: 2}`
/// is 10.50.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    #[serde(default)]
    pub code: String,
    pub minor_units: i64,
    pub decimals: u32,
}

impl Price {
    /// Canonical value as a float: `minor_units / 10^decimals`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        self.minor_units as f64 / 10f64.powi(i32::try_from(self.decimals).unwrap_or(i32::MAX))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picture {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture_id: Option<String>,
    #[serde(default)]
    pub current_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub average_overall_rating: f64,
    #[serde(default)]
    pub rating_count: u32,
    #[serde(default)]
    pub month_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    #[serde(default)]
    pub store_id: String,
    #[serde(default)]
    pub store_name: String,
    /// Distance from the search origin in kilometres.
    #[serde(default)]
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

/// All known items as of the most recent successful poll, keyed by item id.
///
/// Iteration is ordered by item id, which keeps both the persisted JSON and
/// the diff output deterministic across restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<String, ItemRecord>);

impl Snapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `record` unless an item with the same id is already present.
    /// Returns `true` if the record was inserted.
    pub fn insert_first(&mut self, record: ItemRecord) -> bool {
        match self.0.entry(record.id().to_owned()) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ItemRecord> {
        self.0.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ItemRecord)> {
        self.0.iter().map(|(id, record)| (id.as_str(), record))
    }

    /// Number of items with at least one bag left.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.0.values().filter(|r| r.is_available()).count()
    }
}

impl FromIterator<ItemRecord> for Snapshot {
    /// Builds a snapshot keeping the first record seen for each id.
    fn from_iter<I: IntoIterator<Item = ItemRecord>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for record in iter {
            snapshot.insert_first(record);
        }
        snapshot
    }
}

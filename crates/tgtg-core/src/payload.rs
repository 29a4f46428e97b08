//! Typed view of the `discover/v1` response.
//!
//! The response is a list of heterogeneous buckets tagged by `bucket_type`.
//! Only `ITEM` buckets carry item records. Buckets are classified while
//! deserializing so that one odd bucket never fails the whole payload:
//! unknown or malformed buckets become [`Bucket::Unknown`], and malformed
//! entries inside an `ITEM` bucket are skipped with a warning.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::items::ItemRecord;

/// Top-level response from `POST discover/v1`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscoverResults {
    #[serde(default)]
    pub item_availability_status: Option<String>,
    /// Absent or `null` both mean no buckets.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub buckets: Vec<Bucket>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Bucket>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Bucket>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One bucket of the discovery response.
#[derive(Debug, Clone, PartialEq)]
pub enum Bucket {
    Action,
    Header,
    Item {
        display_type: Option<String>,
        items: Vec<ItemRecord>,
    },
    Store,
    /// Any bucket whose `bucket_type` is missing or not recognised. Holds the
    /// raw kind for logging; empty when the field was absent.
    Unknown(String),
}

impl Bucket {
    /// Classifies a raw bucket object by its `bucket_type`.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let kind = value
            .get("bucket_type")
            .and_then(Value::as_str)
            .unwrap_or_default();

        match kind {
            "ACTION" => Bucket::Action,
            "HEADER" => Bucket::Header,
            "STORE" => Bucket::Store,
            "ITEM" => Bucket::Item {
                display_type: value
                    .get("display_type")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
                items: parse_items(value.get("items")),
            },
            other => Bucket::Unknown(other.to_owned()),
        }
    }

    /// Item records carried by this bucket; empty for every non-`ITEM` kind.
    #[must_use]
    pub fn items(&self) -> &[ItemRecord] {
        match self {
            Bucket::Item { items, .. } => items,
            _ => &[],
        }
    }
}

impl<'de> Deserialize<'de> for Bucket {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Bucket::from_value(&value))
    }
}

fn parse_items(raw: Option<&Value>) -> Vec<ItemRecord> {
    let Some(Value::Array(entries)) = raw else {
        return Vec::new();
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            ItemRecord::deserialize(entry)
                .map_err(|e| {
                    tracing::warn!(index, error = %e, "discover: skipping malformed item entry");
                })
                .ok()
        })
        .collect()
}

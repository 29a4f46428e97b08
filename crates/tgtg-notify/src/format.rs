//! Human-readable notification text for a newly available item.
//!
//! The message layout is consumed by existing IFTTT applets, so it is kept
//! byte-for-byte stable:
//!
//! ```text
//! <name>[ (<rating>⭐️)] is on sale for $<price> <meters>m away[ from <start> — <end>]
//! ```

use chrono::{DateTime, FixedOffset};
use tgtg_core::{ItemRecord, Price, Rating};

pub const TEST_MESSAGE: &str = "This is a test notification.";

pub const TEST_IMAGE_URL: &str = "https://upload.wikimedia.org/wikipedia/commons/thumb/6/6f/Too_Good_To_Go_Logo.svg/2560px-Too_Good_To_Go_Logo.svg.png";

/// One outbound webhook call: message text plus an image to attach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub image_url: String,
}

impl Notification {
    #[must_use]
    pub fn for_item(item: &ItemRecord) -> Self {
        Self {
            message: format_message(item),
            image_url: item.item.cover_picture.current_url.clone(),
        }
    }

    /// Fixed payload used at startup to check the webhook wiring.
    #[must_use]
    pub fn test() -> Self {
        Self {
            message: TEST_MESSAGE.to_owned(),
            image_url: TEST_IMAGE_URL.to_owned(),
        }
    }
}

#[must_use]
pub fn format_message(item: &ItemRecord) -> String {
    let rating = item
        .item
        .average_overall_rating
        .as_ref()
        .map(|r| format!(" ({}⭐️)", format_rating(r)))
        .unwrap_or_default();
    let pickup = item
        .pickup_interval
        .as_ref()
        .map(|i| format!(" from {} — {}", format_pickup(&i.start), format_pickup(&i.end)))
        .unwrap_or_default();

    format!(
        "{}{rating} is on sale for ${} {}m away{pickup}",
        item.display_name,
        format_price(&item.item.item_price),
        distance_meters(item.store.distance),
    )
}

/// `minor_units / 10^decimals` in its shortest decimal form: `10.5`, `5`.
#[must_use]
pub fn format_price(price: &Price) -> String {
    price.as_f64().to_string()
}

/// One decimal place, rounding the exact binary value: `4.35` is stored as
/// `4.3499…` and renders `4.3`. Exact ties (`4.25`) take the larger value.
#[must_use]
pub fn format_rating(rating: &Rating) -> String {
    let value = rating.average_overall_rating;
    // Scaling by 4 is exact; an odd quarter is the only way to sit exactly
    // halfway between two tenths.
    let quarters = value * 4.0;
    if quarters.fract() == 0.0 && quarters % 2.0 != 0.0 {
        let up = (value * 10.0).ceil() / 10.0;
        return format!("{up:.1}");
    }
    format!("{value:.1}")
}

/// Kilometres to whole metres.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn distance_meters(distance_km: f64) -> i64 {
    (distance_km * 1000.0).round() as i64
}

/// Abbreviated weekday and 12-hour clock hour in the timestamp's own offset,
/// e.g. `Mon 5PM`.
#[must_use]
pub fn format_pickup(at: &DateTime<FixedOffset>) -> String {
    at.format("%a %-I%p").to_string()
}

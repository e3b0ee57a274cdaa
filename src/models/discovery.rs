//! Persisted record of a discovered free game.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use super::{AppId, PriceSnapshot};

/// Placeholder written for fields the store did not provide.
pub const UNKNOWN: &str = "Unknown";

/// `strftime` pattern of every timestamp in the discoveries file.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A paid game seen at 100% discount, as stored in the discoveries file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredGame {
    /// Store application identifier; unique within the file.
    pub id: AppId,
    /// Display name, or [`UNKNOWN`].
    pub name: String,
    /// Local wall-clock time of discovery, `YYYY-MM-DD HH:MM:SS`.
    pub found_date: String,
    /// Formatted price before discount, or [`UNKNOWN`].
    pub original_price: String,
    /// Local time the discount ends, same format, or [`UNKNOWN`].
    pub end_date: String,
}

impl DiscoveredGame {
    /// Builds a record from a qualifying snapshot.
    ///
    /// The discount end is rendered in the time zone of `found_at`.
    #[inline]
    #[must_use]
    pub fn from_snapshot<Tz>(id: AppId, snapshot: &PriceSnapshot, found_at: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: core::fmt::Display,
    {
        Self {
            id,
            name: snapshot.name.clone().unwrap_or_else(|| UNKNOWN.to_owned()),
            found_date: found_at.format(TIMESTAMP_FORMAT).to_string(),
            original_price: snapshot
                .formatted_initial_price
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_owned()),
            end_date: format_end_date(snapshot.discount_end_timestamp, &found_at.timezone()),
        }
    }
}

/// Renders an optional Unix timestamp in `tz`, or [`UNKNOWN`] when absent,
/// zero, or out of range.
#[inline]
#[must_use]
pub fn format_end_date<Tz>(timestamp: Option<i64>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: core::fmt::Display,
{
    timestamp
        .filter(|&secs| secs != 0)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map_or_else(
            || UNKNOWN.to_owned(),
            |utc| utc.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string(),
        )
}

//! App details response models and the derived price snapshot.

use std::collections::HashMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Discount at which a paid app becomes free.
pub const FULL_DISCOUNT_PERCENT: u32 = 100;

/// Response of the `appdetails` endpoint, keyed by the stringified app id.
pub type AppDetailsResponse = HashMap<String, AppDetailsEntry>;

/// Per-app envelope of the details response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppDetailsEntry {
    /// Whether the store resolved the app.
    pub success: bool,
    /// App payload. The store sends `[]` instead of an object when every
    /// requested filter is empty; that form is read as `None`.
    #[serde(default, deserialize_with = "object_or_empty_array")]
    pub data: Option<AppDetails>,
}

/// App payload restricted to the `basic` and `price_overview` filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AppDetails {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Whether the app is free to play.
    #[serde(default)]
    pub is_free: Option<bool>,
    /// Current pricing, absent for free or unlisted apps.
    #[serde(default)]
    pub price_overview: Option<PriceOverview>,
}

/// Pricing block of an app, amounts in the smallest currency unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PriceOverview {
    /// Price before discount; `0` when missing or `null`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub initial: i64,
    /// Discount in percent; `0` when missing or `null`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub discount_percent: u32,
    /// Human-readable price before discount (e.g. `$9.99`).
    #[serde(default)]
    pub initial_formatted: Option<String>,
    /// Unix timestamp at which the discount ends.
    #[serde(default)]
    pub discount_end_date: Option<i64>,
}

/// Deserializes `data`, mapping the store's empty-array placeholder to `None`.
///
/// Errors from an object payload keep the underlying serde message.
fn object_or_empty_array<'de, D>(deserializer: D) -> Result<Option<AppDetails>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null | Value::Array(_)) => Ok(None),
        Some(value) => AppDetails::deserialize(value)
            .map(Some)
            .map_err(D::Error::custom),
    }
}

/// Deserializes a value, reading `null` as `T::default()`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Price data of one app, flattened from [`AppDetails`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceSnapshot {
    /// Display name, if the store sent one.
    pub name: Option<String>,
    /// Free-to-play flag (absent counts as `false`).
    pub is_free: bool,
    /// Price before discount, in the smallest currency unit.
    pub initial_price: i64,
    /// Discount in percent.
    pub discount_percent: u32,
    /// Formatted price before discount.
    pub formatted_initial_price: Option<String>,
    /// Unix timestamp at which the discount ends.
    pub discount_end_timestamp: Option<i64>,
}

impl PriceSnapshot {
    /// Builds a snapshot from an app payload.
    ///
    /// Returns `None` if the payload has no `price_overview`.
    #[inline]
    #[must_use]
    pub fn from_details(details: &AppDetails) -> Option<Self> {
        let price = details.price_overview.as_ref()?;
        Some(Self {
            name: details.name.clone(),
            is_free: details.is_free.unwrap_or(false),
            initial_price: price.initial,
            discount_percent: price.discount_percent,
            formatted_initial_price: price.initial_formatted.clone(),
            discount_end_timestamp: price.discount_end_date,
        })
    }

    /// Returns `true` for a paid app that is currently 100% off.
    #[inline]
    #[must_use]
    pub const fn is_free_via_full_discount(&self) -> bool {
        !self.is_free && self.initial_price > 0 && self.discount_percent == FULL_DISCOUNT_PERCENT
    }
}

//! Data models for the Steam store endpoints and the discoveries file.
//!
//! Wire models mirror only the fields the monitor reads; unknown fields in
//! store responses are ignored.

mod app_details;
mod discovery;
mod featured;
mod ids;

pub use app_details::{
    AppDetails, AppDetailsEntry, AppDetailsResponse, FULL_DISCOUNT_PERCENT, PriceOverview,
    PriceSnapshot,
};
pub use discovery::{DiscoveredGame, TIMESTAMP_FORMAT, UNKNOWN, format_end_date};
pub use featured::{FeaturedCategories, SpecialItem, SpecialsCategory};
pub use ids::AppId;

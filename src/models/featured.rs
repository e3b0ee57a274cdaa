//! Featured categories (specials listing) response model.

use serde::Deserialize;

use super::AppId;

/// Response of the `featuredcategories` endpoint.
///
/// Only the `specials` category is modelled; the other categories
/// (`coming_soon`, `top_sellers`, numbered spotlights) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeaturedCategories {
    /// The "specials" category, if the store sent one.
    #[serde(default)]
    pub specials: Option<SpecialsCategory>,
}

/// The discounted-items category of the featured listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SpecialsCategory {
    /// Items currently on special.
    #[serde(default)]
    pub items: Option<Vec<SpecialItem>>,
}

/// A single entry of the specials listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpecialItem {
    /// Store application identifier.
    pub id: AppId,
}

impl FeaturedCategories {
    /// Returns the identifiers of all special items in listing order.
    ///
    /// Returns `None` when the response lacks `specials` or
    /// `specials.items`, so callers can tell an empty listing apart from
    /// an unexpected shape.
    #[inline]
    #[must_use]
    pub fn special_ids(&self) -> Option<Vec<AppId>> {
        self.specials
            .as_ref()
            .and_then(|specials| specials.items.as_ref())
            .map(|items| items.iter().map(|item| item.id).collect())
    }
}

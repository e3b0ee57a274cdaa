//! Store item identifier.

use serde::{Deserialize, Serialize};

/// Numeric identifier of a Steam store application.
///
/// The specials listing and the app details endpoint both name items by
/// this value; the details response keys its payload by the stringified
/// form (see [`AppId::response_key`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(u32);

impl AppId {
    /// Creates a new identifier from the given value.
    #[inline]
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the inner numeric value.
    #[inline]
    #[must_use]
    pub const fn into_inner(self) -> u32 {
        self.0
    }

    /// Returns the key under which the details endpoint nests this app.
    #[inline]
    #[must_use]
    pub fn response_key(self) -> String {
        self.0.to_string()
    }
}

impl core::fmt::Display for AppId {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<u32> for AppId {
    #[inline]
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl core::str::FromStr for AppId {
    type Err = core::num::ParseIntError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(Self)
    }
}

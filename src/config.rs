//! Monitor configuration.
//!
//! Every setting has a default matching the store's public endpoints and
//! the hourly polling cadence; the CLI overrides them from flags or
//! environment variables.

use core::time::Duration;
use std::path::PathBuf;

use crate::client::{
    DEFAULT_COUNTRY, DEFAULT_DETAILS_URL, DEFAULT_LANGUAGE, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_SPECIALS_URL, StoreClient,
};
use crate::error::Result;
use crate::storage::FileStorage;

/// Default pause between two cycles.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Default pause between two details requests within a cycle.
pub const DEFAULT_ITEM_DELAY: Duration = Duration::from_secs(1);

/// Default pause after a cycle that failed unexpectedly.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Settings of a [`crate::monitor::Monitor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Specials listing endpoint.
    pub specials_url: String,
    /// App details endpoint.
    pub details_url: String,
    /// Path of the discoveries file.
    pub data_file: PathBuf,
    /// Store country code for prices.
    pub country: String,
    /// Store language for names.
    pub language: String,
    /// Pause between two cycles.
    pub check_interval: Duration,
    /// Courtesy pause after each details request.
    pub item_delay: Duration,
    /// Pause after a cycle that failed unexpectedly.
    pub retry_delay: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Default for MonitorConfig {
    #[inline]
    fn default() -> Self {
        Self {
            specials_url: DEFAULT_SPECIALS_URL.to_owned(),
            details_url: DEFAULT_DETAILS_URL.to_owned(),
            data_file: PathBuf::from(crate::storage::DEFAULT_DATA_FILE),
            country: DEFAULT_COUNTRY.to_owned(),
            language: DEFAULT_LANGUAGE.to_owned(),
            check_interval: DEFAULT_CHECK_INTERVAL,
            item_delay: DEFAULT_ITEM_DELAY,
            retry_delay: DEFAULT_RETRY_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl MonitorConfig {
    /// Creates a configuration with all defaults.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the specials listing endpoint.
    #[inline]
    #[must_use]
    pub fn specials_url<T: Into<String>>(mut self, url: T) -> Self {
        self.specials_url = url.into();
        self
    }

    /// Overrides the app details endpoint.
    #[inline]
    #[must_use]
    pub fn details_url<T: Into<String>>(mut self, url: T) -> Self {
        self.details_url = url.into();
        self
    }

    /// Overrides the discoveries file path.
    #[inline]
    #[must_use]
    pub fn data_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_file = path.into();
        self
    }

    /// Overrides the store country code.
    #[inline]
    #[must_use]
    pub fn country<T: Into<String>>(mut self, country: T) -> Self {
        self.country = country.into();
        self
    }

    /// Overrides the store language.
    #[inline]
    #[must_use]
    pub fn language<T: Into<String>>(mut self, language: T) -> Self {
        self.language = language.into();
        self
    }

    /// Overrides the pause between cycles.
    #[inline]
    #[must_use]
    pub const fn check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Overrides the pause between details requests.
    #[inline]
    #[must_use]
    pub const fn item_delay(mut self, delay: Duration) -> Self {
        self.item_delay = delay;
        self
    }

    /// Overrides the pause after a failed cycle.
    #[inline]
    #[must_use]
    pub const fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Overrides the per-request HTTP timeout.
    #[inline]
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builds the store client described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint URL is invalid or the HTTP client
    /// fails to build.
    #[inline]
    pub fn store_client(&self) -> Result<StoreClient> {
        StoreClient::builder()
            .specials_url(self.specials_url.as_str())
            .details_url(self.details_url.as_str())
            .country(self.country.as_str())
            .language(self.language.as_str())
            .timeout(self.request_timeout)
            .build()
    }

    /// Returns a file storage at [`MonitorConfig::data_file`].
    #[inline]
    #[must_use]
    pub fn file_storage(&self) -> FileStorage {
        FileStorage::new(self.data_file.clone())
    }
}

//! Error types for the steam-freebies library.

/// Convenient result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, FreebiesError>;

/// All errors that can occur while watching the store.
#[derive(Debug, thiserror::Error)]
pub enum FreebiesError {
    /// HTTP transport failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status code.
    #[error("store API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, or a placeholder if it could not be read.
        message: String,
    },

    /// An endpoint URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The discoveries file could not be read or written.
    #[error("storage error: {0}")]
    Storage(Box<dyn core::error::Error + Send + Sync>),

    /// A builder was finished without a required component.
    #[error("missing component: {0}")]
    MissingComponent(&'static str),
}

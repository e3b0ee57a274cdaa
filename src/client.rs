//! Async HTTP client for the Steam store endpoints.
//!
//! Wraps a single pooled [`reqwest::Client`] with a bounded request
//! timeout. Errors are returned to the caller; the monitor decides how to
//! degrade them.

use core::time::Duration;

use url::Url;

use crate::error::{FreebiesError, Result};
use crate::models::{AppDetailsEntry, AppDetailsResponse, AppId, FeaturedCategories};

/// Default specials listing endpoint.
pub const DEFAULT_SPECIALS_URL: &str = "https://store.steampowered.com/api/featuredcategories";

/// Default app details endpoint.
pub const DEFAULT_DETAILS_URL: &str = "https://store.steampowered.com/api/appdetails";

/// Default store region for prices.
pub const DEFAULT_COUNTRY: &str = "us";

/// Default language for names.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Field filter sent to the details endpoint.
const DETAILS_FILTERS: &str = "price_overview,basic";

/// User agent sent with every request.
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Builder for constructing a [`StoreClient`].
#[derive(Debug)]
pub struct StoreClientBuilder {
    /// Specials listing URL override.
    specials_url: Option<String>,
    /// App details URL override.
    details_url: Option<String>,
    /// Country code override.
    country: Option<String>,
    /// Language override.
    language: Option<String>,
    /// Request timeout override.
    timeout: Option<Duration>,
}

impl StoreClientBuilder {
    /// Overrides the specials listing URL (useful for testing with a mock server).
    #[inline]
    #[must_use]
    pub fn specials_url<T: Into<String>>(mut self, url: T) -> Self {
        self.specials_url = Some(url.into());
        self
    }

    /// Overrides the app details URL (useful for testing with a mock server).
    #[inline]
    #[must_use]
    pub fn details_url<T: Into<String>>(mut self, url: T) -> Self {
        self.details_url = Some(url.into());
        self
    }

    /// Sets the store country code used for prices.
    #[inline]
    #[must_use]
    pub fn country<T: Into<String>>(mut self, country: T) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Sets the language used for names.
    #[inline]
    #[must_use]
    pub fn language<T: Into<String>>(mut self, language: T) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the per-request timeout.
    #[inline]
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`FreebiesError::InvalidUrl`] if an endpoint URL does not parse.
    /// Returns [`FreebiesError::Http`] if the HTTP client fails to build.
    #[inline]
    #[tracing::instrument(skip_all)]
    pub fn build(self) -> Result<StoreClient> {
        let specials_url = Url::parse(self.specials_url.as_deref().unwrap_or(DEFAULT_SPECIALS_URL))?;
        let details_url = Url::parse(self.details_url.as_deref().unwrap_or(DEFAULT_DETAILS_URL))?;
        let timeout = self.timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        tracing::debug!(
            specials_url = %specials_url,
            details_url = %details_url,
            timeout_secs = timeout.as_secs(),
            "building store client"
        );
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(StoreClient {
            http,
            specials_url,
            details_url,
            country: self.country.unwrap_or_else(|| DEFAULT_COUNTRY.to_owned()),
            language: self.language.unwrap_or_else(|| DEFAULT_LANGUAGE.to_owned()),
        })
    }
}

/// Async client for the Steam store's public catalog API.
///
/// Use [`StoreClient::builder()`] to construct an instance.
#[derive(Debug)]
pub struct StoreClient {
    /// Underlying HTTP client.
    http: reqwest::Client,
    /// Specials listing endpoint.
    specials_url: Url,
    /// App details endpoint.
    details_url: Url,
    /// Store country code.
    country: String,
    /// Store language.
    language: String,
}

impl StoreClient {
    /// Creates a new builder for configuring the client.
    #[inline]
    #[must_use]
    pub const fn builder() -> StoreClientBuilder {
        StoreClientBuilder {
            specials_url: None,
            details_url: None,
            country: None,
            language: None,
            timeout: None,
        }
    }

    /// Fetches the featured categories listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the server returns a
    /// non-success status, or the response cannot be deserialized.
    #[inline]
    #[tracing::instrument(skip_all)]
    pub async fn featured_categories(&self) -> Result<FeaturedCategories> {
        tracing::debug!("calling featured categories endpoint");
        self.get_json(self.specials_url.clone()).await
    }

    /// Fetches price and basic details of one app.
    ///
    /// Returns `Ok(None)` if the response has no entry for `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the server returns a
    /// non-success status, or the response cannot be deserialized.
    #[inline]
    #[tracing::instrument(skip_all, fields(app_id = %id))]
    pub async fn app_details(&self, id: AppId) -> Result<Option<AppDetailsEntry>> {
        let url = self.details_request_url(id);
        tracing::debug!("calling app details endpoint");
        let mut response: AppDetailsResponse = self.get_json(url).await?;
        Ok(response.remove(&id.response_key()))
    }

    /// Returns the details URL with the query for `id`.
    fn details_request_url(&self, id: AppId) -> Url {
        let mut url = self.details_url.clone();
        _ = url
            .query_pairs_mut()
            .append_pair("appids", &id.response_key())
            .append_pair("cc", &self.country)
            .append_pair("l", &self.language)
            .append_pair("filters", DETAILS_FILTERS);
        url
    }

    /// Sends a GET request and deserializes the JSON response.
    async fn get_json<Resp: serde::de::DeserializeOwned>(&self, url: Url) -> Result<Resp> {
        tracing::trace!(url = %url, "sending GET request");
        let response = self.http.get(url).send().await?;
        Self::handle_response(response).await
    }

    /// Handles an HTTP response, checking status and deserializing the body.
    async fn handle_response<Resp: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Resp> {
        let status = response.status();
        tracing::debug!(status = %status, "received response");
        if status.is_success() {
            let body = response.text().await?;
            tracing::trace!(body_len = body.len(), "parsing response body");
            serde_json::from_str(&body).map_err(FreebiesError::from)
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_owned());
            Err(FreebiesError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> StoreClient {
        StoreClient::builder()
            .specials_url(format!("{}/api/featuredcategories", server.uri()))
            .details_url(format!("{}/api/appdetails", server.uri()))
            .build()
            .unwrap()
    }

    #[test]
    fn builder_defaults() {
        let client = StoreClient::builder().build().unwrap();
        assert_eq!(client.specials_url.as_str(), DEFAULT_SPECIALS_URL);
        assert_eq!(client.details_url.as_str(), DEFAULT_DETAILS_URL);
        assert_eq!(client.country, "us");
        assert_eq!(client.language, "en");
    }

    #[test]
    fn builder_rejects_invalid_url() {
        let result = StoreClient::builder().specials_url("not a url").build();
        assert!(matches!(result, Err(FreebiesError::InvalidUrl(_))));
    }

    #[test]
    fn details_url_carries_query() {
        let client = StoreClient::builder().build().unwrap();
        let url = client.details_request_url(AppId::new(10));
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("appids".to_owned(), "10".to_owned()),
                ("cc".to_owned(), "us".to_owned()),
                ("l".to_owned(), "en".to_owned()),
                ("filters".to_owned(), "price_overview,basic".to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn featured_categories_parses_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/featuredcategories"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"specials": {"items": [{"id": 10}, {"id": 20}]}}"#,
            ))
            .mount(&server)
            .await;

        let listing = client_for(&server).featured_categories().await.unwrap();
        assert_eq!(
            listing.special_ids(),
            Some(vec![AppId::new(10), AppId::new(20)])
        );
    }

    #[tokio::test]
    async fn app_details_sends_filters_and_extracts_entry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/appdetails"))
            .and(query_param("appids", "10"))
            .and(query_param("cc", "us"))
            .and(query_param("l", "en"))
            .and(query_param("filters", "price_overview,basic"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"10": {"success": true, "data": {"name": "Game A"}}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let entry = client_for(&server)
            .app_details(AppId::new(10))
            .await
            .unwrap()
            .unwrap();
        assert!(entry.success);
        assert_eq!(entry.data.unwrap().name.as_deref(), Some("Game A"));
    }

    #[tokio::test]
    async fn app_details_missing_key_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/appdetails"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{}"#))
            .mount(&server)
            .await;

        let entry = client_for(&server).app_details(AppId::new(10)).await.unwrap();
        assert!(entry.is_none());
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = client_for(&server).featured_categories().await.unwrap_err();
        match err {
            FreebiesError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "slow down");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_json_is_serialization_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).featured_categories().await.unwrap_err();
        assert!(matches!(err, FreebiesError::Serialization(_)));
    }
}

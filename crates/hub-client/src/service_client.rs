//! High-level hub client bound to a host and SAS credentials.
//!
//! This module provides `HubServiceClient`, which combines hub credentials
//! with an HTTP client and provides authenticated request builders plus
//! typed JSON methods.
//!
//! ## Security
//!
//! - SAS tokens are redacted in Debug output
//! - Sensitive parameters are skipped in tracing spans

use serde::{de::DeserializeOwned, Serialize};
use tracing::instrument;

use crate::client::HubHttpClient;
use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::request::{RequestBuilder, RequestMethod};
use crate::DEFAULT_API_VERSION;

/// High-level device-management hub client.
///
/// Combines hub credentials with HTTP infrastructure and provides
/// authenticated request builders and typed JSON methods. It's designed to
/// be used by higher-level API-specific crates (devicehub-query, etc.).
///
/// ## Security
///
/// The SAS token is redacted in Debug output to prevent accidental
/// exposure in logs.
///
/// # Example
///
/// ```rust,ignore
/// use devicehub_client::HubServiceClient;
///
/// let sas_token = std::env::var("HUB_SAS_TOKEN")?;
/// let client = HubServiceClient::new("contoso-hub.devices.example.net", sas_token)?;
///
/// // GET with typed response
/// let stats: RegistryStatistics = client.get_json("/statistics/devices").await?;
/// ```
#[derive(Clone)]
pub struct HubServiceClient {
    http: HubHttpClient,
    base_url: String,
    sas_token: String,
    api_version: String,
}

impl std::fmt::Debug for HubServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubServiceClient")
            .field("base_url", &self.base_url)
            .field("sas_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl HubServiceClient {
    /// Create a new hub client for the given host and SAS token.
    ///
    /// `host` is the hub hostname (e.g. `contoso-hub.devices.example.net`),
    /// with or without an explicit scheme; `https` is assumed when none is
    /// given. Token generation is the caller's concern: the token is
    /// attached verbatim as the `Authorization` header of every request and
    /// must remain valid for as long as the client is used.
    pub fn new(host: impl Into<String>, sas_token: impl Into<String>) -> Result<Self> {
        Self::with_config(host, sas_token, ClientConfig::default())
    }

    /// Create a new hub client with custom configuration.
    pub fn with_config(
        host: impl Into<String>,
        sas_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let host = host.into().trim_end_matches('/').to_string();
        let sas_token = sas_token.into();

        if host.is_empty() {
            return Err(Error::new(ErrorKind::Config(
                "hub host must not be empty".to_string(),
            )));
        }
        if sas_token.is_empty() {
            return Err(Error::new(ErrorKind::Config(
                "SAS token must not be empty".to_string(),
            )));
        }

        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("https://{host}")
        };
        // Reject hosts that cannot form a valid URL before any request is made.
        url::Url::parse(&base_url)?;

        let http = HubHttpClient::new(config)?;
        Ok(Self {
            http,
            base_url,
            sas_token,
            api_version: DEFAULT_API_VERSION.to_string(),
        })
    }

    /// Set the API version (e.g., "2021-04-12").
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the SAS token.
    pub fn sas_token(&self) -> &str {
        &self.sas_token
    }

    /// Get the API version.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Build the full URL for a path.
    ///
    /// If the path starts with `/`, it's appended to the base URL.
    /// Otherwise, it's assumed to be a full URL.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Build a service URL for a path, appending the `api-version` parameter.
    ///
    /// Example: `service_url("devices/query")` ->
    /// `https://contoso-hub.devices.example.net/devices/query?api-version=2021-04-12`
    pub fn service_url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!(
            "{}/{}?api-version={}",
            self.base_url, path, self.api_version
        )
    }

    // =========================================================================
    // Base HTTP Methods (with authentication)
    // =========================================================================

    /// Create a request builder for an arbitrary method, with authentication.
    pub fn request(&self, method: RequestMethod, url: &str) -> RequestBuilder {
        self.http.request(method, url).authorization(&self.sas_token)
    }

    /// Create a GET request builder with authentication.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.http.get(url).authorization(&self.sas_token)
    }

    /// Create a POST request builder with authentication.
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.http.post(url).authorization(&self.sas_token)
    }

    /// Create a PUT request builder with authentication.
    pub fn put(&self, url: &str) -> RequestBuilder {
        self.http.put(url).authorization(&self.sas_token)
    }

    /// Create a DELETE request builder with authentication.
    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.http.delete(url).authorization(&self.sas_token)
    }

    /// Execute a request and return the raw response.
    pub async fn execute(&self, request: RequestBuilder) -> Result<crate::Response> {
        self.http.execute(request).await
    }

    // =========================================================================
    // Typed JSON Methods
    // =========================================================================

    /// GET request with JSON response deserialization.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let full_url = self.url(url);
        let request = self.get(&full_url);
        let response = self.http.execute(request).await?;
        response.json().await
    }

    /// POST request with JSON body and response.
    #[instrument(skip(self, body), fields(url = %url))]
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let full_url = self.url(url);
        let request = self.post(&full_url).json(body)?;
        let response = self.http.execute(request).await?;
        response.json().await
    }
}

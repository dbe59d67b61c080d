//! # devicehub-client
//!
//! Core HTTP client infrastructure for the device-management hub APIs.
//!
//! This crate provides the foundational HTTP client with:
//! - Automatic retry with exponential backoff and jitter
//! - Rate limit detection and `Retry-After` handling
//! - SAS-authenticated requests
//! - Hub error payload parsing with credential redaction
//! - Connection pooling
//! - Request/response tracing
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! │  (devicehub-query, ...)                                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   HubServiceClient                          │
//! │  - Holds host + SAS token + HTTP client                     │
//! │  - Builds service URLs with api-version                     │
//! │  - Provides typed JSON methods (get_json, post_json)        │
//! │  - Handles authentication headers                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    HubHttpClient                            │
//! │  - Raw HTTP with retry and rate limiting                    │
//! │  - Request building with paging headers                     │
//! │  - Response handling                                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use devicehub_client::{HubServiceClient, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), devicehub_client::Error> {
//!     let sas_token = std::env::var("HUB_SAS_TOKEN").unwrap();
//!     let client = HubServiceClient::new("contoso-hub.devices.example.net", sas_token)?;
//!
//!     // Typed JSON request
//!     let stats: serde_json::Value = client
//!         .get_json("/statistics/devices")
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod request;
mod response;
mod retry;
mod service_client;

pub use client::HubHttpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, ErrorKind, Result};
pub use request::{RequestBuilder, RequestMethod};
pub use response::{Response, ResponseExt};
pub use retry::{RetryConfig, RetryPolicy};
pub use service_client::HubServiceClient;

/// Default hub API version
pub const DEFAULT_API_VERSION: &str = "2021-04-12";

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("devicehub-api/", env!("CARGO_PKG_VERSION"));

/// Request header carrying the page size for paged queries.
pub const MAX_ITEM_COUNT_HEADER: &str = "x-ms-max-item-count";

/// Header carrying the continuation token of a paged query. Sent on requests
/// to resume a query; returned on responses when more pages remain.
pub const CONTINUATION_HEADER: &str = "x-ms-continuation";

/// Response header tagging the kind of item in a query page.
pub const ITEM_TYPE_HEADER: &str = "x-ms-item-type";

/// Response header carrying the server-assigned request id.
pub const REQUEST_ID_HEADER: &str = "x-ms-request-id";

//! # devicehub-api
//!
//! Rust client library for a device-management hub service.
//!
//! This crate aggregates the per-surface crates behind feature flags:
//!
//! - [`client`] - HTTP core: SAS-authenticated requests, retry with backoff,
//!   rate-limit handling, hub error parsing (`devicehub-client`)
//! - [`query`] - paginated device/twin/job queries driven by continuation
//!   tokens (`devicehub-query`)
//!
//! By default all surfaces are enabled. Depend on individual features to
//! slim the dependency tree:
//!
//! ```toml
//! [dependencies]
//! devicehub-api = { version = "0.1", default-features = false, features = ["query"] }
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use devicehub_api::query::QueryClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sas_token = std::env::var("HUB_SAS_TOKEN")?;
//!     let client = QueryClient::new("contoso-hub.devices.example.net", sas_token)?;
//!
//!     let mut twins = client.query_twins("SELECT * FROM devices")?;
//!     while let Some(page) = twins.next().await? {
//!         println!("{}", page.body());
//!     }
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "client")]
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
pub use devicehub_client as client;

#[cfg(feature = "query")]
#[cfg_attr(docsrs, doc(cfg(feature = "query")))]
pub use devicehub_query as query;

// Convenience re-exports of the types most applications touch directly.
#[cfg(feature = "client")]
pub use devicehub_client::{ClientConfig, HubServiceClient};

#[cfg(feature = "query")]
pub use devicehub_query::{QueryClient, QueryCollection, QueryOptions, QueryType};

//! # devicehub-query
//!
//! Paginated query client for the device hub service.
//!
//! ## Features
//!
//! - **SQL-style queries** - Device twins, raw aggregations, and scheduled
//!   jobs via `SELECT ... FROM ...` text
//! - **Typed listings** - Job execution responses filtered by type and
//!   status, no query text required
//! - **Continuation-token paging** - Iterator-style `has_next`/`next` over
//!   result pages, with per-call page size and token overrides
//! - **Item-type checking** - Every page is checked against the item type
//!   the query asked for before it is handed back
//!
//! ## Example
//!
//! ```rust,ignore
//! use devicehub_query::QueryClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), devicehub_query::Error> {
//!     let client = QueryClient::new(
//!         "contoso-hub.devices.example.net",
//!         "SharedAccessSignature sr=...&sig=...&se=...",
//!     )?;
//!
//!     let mut twins = client.query_twins("SELECT * FROM devices")?;
//!     while twins.has_next().await? {
//!         if let Some(page) = twins.next().await? {
//!             println!("page: {}", page.body());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod collection;
mod error;
mod options;
mod paging;
mod response;
mod types;
pub mod validate;

// Typed query surface
pub use client::{JobResponseFilter, QueryClient, DEFAULT_PAGE_SIZE};

// Paginated collection
pub use collection::{QueryCollection, QuerySpec, QueryTarget, DEFAULT_FETCH_TIMEOUT};

// Error types
pub use error::{Error, ErrorKind, Result};

// Per-request options and page payloads
pub use options::QueryOptions;
pub use response::QueryCollectionResponse;

// Item types
pub use types::QueryType;

// Re-export hub-client types that users might need
pub use devicehub_client::{ClientConfig, ClientConfigBuilder, HubServiceClient, RequestMethod};

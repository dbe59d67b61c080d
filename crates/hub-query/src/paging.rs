//! Pure pagination bookkeeping: header precedence and the page state machine.
//!
//! Nothing in this module touches the network, which keeps the fiddly parts
//! of the paging protocol testable in isolation.

use crate::options::QueryOptions;
use crate::response::QueryCollectionResponse;

/// Concrete values for one page fetch, after precedence resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PageRequest {
    /// Page size to request via `x-ms-max-item-count`.
    pub page_size: u32,
    /// Token to send via `x-ms-continuation`, if the fetch resumes a query.
    pub continuation: Option<String>,
}

/// Resolve the header values for a fetch.
///
/// The continuation token is taken from `options` when present and
/// non-empty, then from the token the previous page left behind, and is
/// omitted entirely for a first page. The page size is the options override
/// or the collection default.
pub(crate) fn resolve(
    options: Option<&QueryOptions>,
    stored_token: Option<&str>,
    default_page_size: u32,
) -> PageRequest {
    let continuation = options
        .and_then(|o| o.continuation_token.as_deref())
        // An empty token is treated as absent, not as an override.
        .filter(|token| !token.is_empty())
        .or(stored_token)
        .map(str::to_owned);

    let page_size = options
        .and_then(|o| o.page_size)
        .unwrap_or(default_page_size);

    PageRequest {
        page_size,
        continuation,
    }
}

/// Pagination state of a query collection.
///
/// ```text
///         fetch                 consume
/// Fresh ────────▶ Ready(page) ──────────▶ Continuable(token)   if page had a token
///                    ▲    │
///                    │    └─────────────▶ Exhausted            otherwise
///                  fetch
///                    │
///              Continuable
/// ```
///
/// `has_next` answers from the state alone except in `Continuable`, where
/// it performs the fetch; `next` consumes the `Ready` page, fetching first
/// when the collection is still `Fresh`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PageState {
    /// No page has been fetched yet. A fresh query always has its first
    /// page to offer, so this state answers `has_next` without a request.
    Fresh,
    /// A fetched page is waiting to be handed out.
    Ready(QueryCollectionResponse),
    /// The last page was handed out and left a token for the next one.
    Continuable(String),
    /// The last page was handed out and no token remains.
    Exhausted,
}

impl PageState {
    /// Continuation token a fetch should resume from, if any.
    pub(crate) fn stored_token(&self) -> Option<&str> {
        match self {
            PageState::Ready(page) => page.continuation_token(),
            PageState::Continuable(token) => Some(token),
            PageState::Fresh | PageState::Exhausted => None,
        }
    }

    /// Record a freshly fetched page, replacing whatever was here.
    pub(crate) fn store(&mut self, page: QueryCollectionResponse) {
        *self = PageState::Ready(page);
    }

    /// Hand the pending page to the caller, keeping only its token.
    ///
    /// Returns `None` without changing state when no page is pending.
    pub(crate) fn consume(&mut self) -> Option<QueryCollectionResponse> {
        match std::mem::replace(self, PageState::Exhausted) {
            PageState::Ready(page) => {
                *self = match page.continuation_token() {
                    Some(token) => PageState::Continuable(token.to_owned()),
                    None => PageState::Exhausted,
                };
                Some(page)
            }
            other => {
                *self = other;
                None
            }
        }
    }
}

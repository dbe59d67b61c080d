//! The query-collection pagination engine.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, instrument};

use devicehub_client::{HubServiceClient, RequestBuilder, RequestMethod, Response};

use crate::error::{Error, Result};
use crate::options::QueryOptions;
use crate::paging::{self, PageState};
use crate::response::QueryCollectionResponse;
use crate::types::QueryType;
use crate::validate::validate_query_text;

/// Default per-fetch timeout for query requests.
///
/// Applies to one page fetch, not the whole multi-page query.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// What a query asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySpec {
    /// SQL-style query; the text travels as the JSON request body.
    Sql(String),
    /// Typed listing steered entirely by URL and headers; no body.
    Typed,
}

/// Where query pages are fetched from.
#[derive(Debug, Clone)]
pub struct QueryTarget {
    /// Fully qualified query endpoint URL, including the api-version
    /// parameter and any endpoint-specific filters.
    pub url: String,
    /// HTTP method the endpoint expects.
    pub method: RequestMethod,
    /// Timeout for each page fetch.
    pub timeout: Duration,
}

impl QueryTarget {
    /// Create a target with the default fetch timeout.
    pub fn new(url: impl Into<String>, method: RequestMethod) -> Self {
        Self {
            url: url.into(),
            method,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Set the per-fetch timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Serialized body of a SQL query request.
#[derive(Debug, Serialize)]
struct QueryRequestBody<'a> {
    query: &'a str,
}

/// A paginated query against a hub resource collection.
///
/// Pages are pulled one at a time through the [`has_next`]/[`next`]
/// protocol. `has_next` answers whether a page is, or can be made,
/// available; it fetches only when the previously consumed page left a
/// continuation token, so repeated peeks are free. `next` hands out the
/// pending page, performing the initial fetch on a fresh collection.
/// Errors never fold into `false`/`None`; they propagate to the caller.
///
/// One owner drives a collection; the `&mut self` receivers make
/// interleaved use from several tasks a compile error instead of a data
/// race. Dropping the collection mid-query needs no cleanup, since the
/// server tracks nothing but the opaque token.
///
/// # Example
///
/// ```rust,ignore
/// let mut twins = client.query_twins("SELECT * FROM devices")?;
/// while let Some(page) = twins.next().await? {
///     println!("{}", page.body());
/// }
/// ```
///
/// [`has_next`]: QueryCollection::has_next
/// [`next`]: QueryCollection::next
#[derive(Debug)]
pub struct QueryCollection {
    client: HubServiceClient,
    target: QueryTarget,
    spec: QuerySpec,
    page_size: u32,
    query_type: QueryType,
    state: PageState,
}

impl QueryCollection {
    /// Create a collection that pages through `target`.
    ///
    /// Fails with `InvalidArgument` when the SQL text lacks its mandatory
    /// clauses, `page_size` is zero, `query_type` is the unknown sentinel,
    /// or the target URL is empty or unparseable. All of these would
    /// otherwise surface as confusing server-side rejections midway through
    /// an enumeration.
    pub fn new(
        client: HubServiceClient,
        target: QueryTarget,
        spec: QuerySpec,
        page_size: u32,
        query_type: QueryType,
    ) -> Result<Self> {
        if let QuerySpec::Sql(ref text) = spec {
            validate_query_text(text)?;
        }
        if page_size == 0 {
            return Err(Error::invalid_argument("page size must be positive"));
        }
        if query_type == QueryType::Unknown {
            return Err(Error::invalid_argument(
                "query type must not be the unknown sentinel",
            ));
        }
        if target.url.is_empty() {
            return Err(Error::invalid_argument("target URL must not be empty"));
        }
        url::Url::parse(&target.url)
            .map_err(|e| Error::invalid_argument(format!("target URL: {e}")))?;

        Ok(Self {
            client,
            target,
            spec,
            page_size,
            query_type,
            state: PageState::Fresh,
        })
    }

    /// Default page size, used when a fetch carries no override.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// The kind of items this query was created for.
    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    /// True when the query carries SQL text (and thus a request body).
    pub fn is_sql_query(&self) -> bool {
        matches!(self.spec, QuerySpec::Sql(_))
    }

    /// Fetch one page, replacing any previously fetched page.
    ///
    /// The continuation token is resolved in precedence order: a non-empty
    /// token in `options` first, then the token left by the previous page,
    /// then none (first page of the query). The page-size header is the
    /// options override or the collection default; a zero override is
    /// rejected with `InvalidArgument` before anything goes on the wire.
    ///
    /// [`has_next`](Self::has_next)/[`next`](Self::next) call this as
    /// needed; calling it directly also works and never marks the fetched
    /// page as consumed.
    #[instrument(skip(self, options), fields(query_type = %self.query_type, url = %self.target.url))]
    pub async fn send_query_request(
        &mut self,
        options: Option<&QueryOptions>,
    ) -> Result<&QueryCollectionResponse> {
        if options.and_then(|o| o.page_size) == Some(0) {
            return Err(Error::invalid_argument("page size override must be positive"));
        }

        let page = paging::resolve(options, self.state.stored_token(), self.page_size);

        let mut request = self
            .request_builder()
            .max_item_count(page.page_size)
            .timeout(self.target.timeout);
        if let Some(token) = page.continuation {
            request = request.continuation(token);
        }
        request = match self.spec {
            QuerySpec::Sql(ref text) => request.json(&QueryRequestBody { query: text })?,
            QuerySpec::Typed => request.bytes(Vec::new()),
        };

        let response = self.client.execute(request).await?;
        let (body, token) = classify_response(self.query_type, response).await?;

        debug!(
            page_bytes = body.len(),
            has_continuation = token.is_some(),
            "query page received"
        );

        self.state.store(QueryCollectionResponse::new(body, token));
        let PageState::Ready(ref page) = self.state else {
            unreachable!("store always leaves a pending page")
        };
        Ok(page)
    }

    /// True when an unconsumed page is available or another page can be
    /// fetched.
    ///
    /// On a fresh collection this is true without any network call (the
    /// first page is fetched by [`next`](Self::next)). After a page was
    /// consumed, this fetches the follow-up page when a continuation token
    /// remains, so it fetches at most once per consumed page.
    pub async fn has_next(&mut self) -> Result<bool> {
        self.has_next_inner(None).await
    }

    /// [`has_next`](Self::has_next), steering any triggered fetch with
    /// `options`.
    pub async fn has_next_with(&mut self, options: &QueryOptions) -> Result<bool> {
        self.has_next_inner(Some(options)).await
    }

    async fn has_next_inner(&mut self, options: Option<&QueryOptions>) -> Result<bool> {
        match self.state {
            PageState::Fresh => Ok(true),
            PageState::Ready(_) => Ok(true),
            PageState::Continuable(_) => {
                // Fetch errors propagate instead of masquerading as "no
                // more pages"; the token is kept, so the caller may retry.
                self.send_query_request(options).await?;
                Ok(true)
            }
            PageState::Exhausted => Ok(false),
        }
    }

    /// Hand out the next page, fetching it first when necessary.
    ///
    /// Returns `Ok(None)` once the query is exhausted.
    pub async fn next(&mut self) -> Result<Option<QueryCollectionResponse>> {
        self.next_inner(None).await
    }

    /// [`next`](Self::next), steering any triggered fetch with `options`.
    pub async fn next_with(
        &mut self,
        options: &QueryOptions,
    ) -> Result<Option<QueryCollectionResponse>> {
        self.next_inner(Some(options)).await
    }

    async fn next_inner(
        &mut self,
        options: Option<&QueryOptions>,
    ) -> Result<Option<QueryCollectionResponse>> {
        if !self.has_next_inner(options).await? {
            return Ok(None);
        }
        // has_next does not perform the initial fetch; do it here.
        if matches!(self.state, PageState::Fresh) {
            self.send_query_request(options).await?;
        }
        Ok(self.state.consume())
    }

    fn request_builder(&self) -> RequestBuilder {
        self.client.request(self.target.method, &self.target.url)
    }
}

/// Classify a page response.
///
/// The item-type header must be present, recognized, and name the kind of
/// item the query asked for; anything else means the server and client
/// disagree about which collection is being read, and the page must not be
/// silently accepted.
async fn classify_response(
    expected: QueryType,
    response: Response,
) -> Result<(String, Option<String>)> {
    let raw_item_type = response.item_type().map(str::to_owned);
    let token = response
        .continuation()
        .filter(|token| !token.is_empty())
        .map(str::to_owned);

    let item_type = match raw_item_type {
        Some(ref tag) => QueryType::from_wire(tag),
        None => {
            return Err(Error::malformed_response(
                "response carries no x-ms-item-type header",
            ))
        }
    };
    if item_type == QueryType::Unknown {
        return Err(Error::malformed_response(format!(
            "unrecognized item type {:?}",
            raw_item_type.as_deref().unwrap_or_default()
        )));
    }
    if item_type != expected {
        return Err(Error::malformed_response(format!(
            "item type mismatch: requested {expected}, server answered {item_type}"
        )));
    }

    let body = response.text().await?;
    Ok((body, token))
}

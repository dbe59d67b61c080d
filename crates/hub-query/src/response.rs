//! Query page responses.

/// One fetched page of query results.
///
/// Holds the raw response payload together with the continuation token the
/// service issued for the page after this one. Interpreting the payload
/// (parsing twin documents, job records, ...) is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCollectionResponse {
    body: String,
    continuation_token: Option<String>,
}

impl QueryCollectionResponse {
    pub(crate) fn new(body: String, continuation_token: Option<String>) -> Self {
        Self {
            body,
            continuation_token,
        }
    }

    /// Raw response payload for this page.
    ///
    /// May be empty: a page with no items but a continuation token is a
    /// valid (if unusual) reply, and the token still leads to the rest of
    /// the results.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Consume the page, returning the payload.
    pub fn into_body(self) -> String {
        self.body
    }

    /// Token that resumes the query after this page; `None` on the last one.
    pub fn continuation_token(&self) -> Option<&str> {
        self.continuation_token.as_deref()
    }
}

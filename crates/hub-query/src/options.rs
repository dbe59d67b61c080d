//! Per-fetch query options.

/// Options applied to a single page fetch.
///
/// Both fields are optional. A set continuation token overrides the token
/// stored from the previous page; a set page size overrides the default the
/// collection was created with. Unset fields fall back to the stored state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Continuation token to resume from.
    pub continuation_token: Option<String>,
    /// Page size for this fetch.
    pub page_size: Option<u32>,
}

impl QueryOptions {
    /// Create empty options; every value falls back to the stored state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume the query from the given continuation token instead of the
    /// one the previous page left behind.
    pub fn with_continuation_token(mut self, token: impl Into<String>) -> Self {
        self.continuation_token = Some(token.into());
        self
    }

    /// Request a specific page size for this fetch.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

//! Error types for devicehub-query.

/// Result type alias for query operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error returned by query operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Underlying cause, when one exists.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create an error without an underlying source.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument(message.into()))
    }

    pub(crate) fn malformed_response(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedResponse(message.into()))
    }

    /// Whether the error was caught client-side before any network activity.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidArgument(_))
    }

    /// Whether the server's response violated the paging protocol.
    pub fn is_malformed_response(&self) -> bool {
        matches!(self.kind, ErrorKind::MalformedResponse(_))
    }

    /// Whether the error came from the underlying transport.
    pub fn is_transport(&self) -> bool {
        matches!(self.kind, ErrorKind::Transport(_))
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Caller-supplied parameters violate a precondition (malformed query
    /// text, zero page size, unusable target). Detected before any request
    /// is sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The response does not identify its page contents correctly: the
    /// item-type header is missing, unrecognized, or names a different kind
    /// of item than the query asked for.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Failure in the underlying HTTP transport, propagated as-is. Retry
    /// decisions beyond the client's own policy are the caller's.
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<devicehub_client::Error> for Error {
    fn from(err: devicehub_client::Error) -> Self {
        Error {
            kind: ErrorKind::Transport(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_predicates() {
        assert!(Error::invalid_argument("bad page size").is_invalid_argument());
        assert!(Error::malformed_response("no item type").is_malformed_response());

        let client_err = devicehub_client::Error::new(devicehub_client::ErrorKind::Timeout);
        let err: Error = client_err.into();
        assert!(err.is_transport());
        assert!(!err.is_invalid_argument());
    }

    #[test]
    fn test_transport_preserves_source() {
        let client_err = devicehub_client::Error::new(devicehub_client::ErrorKind::Unauthorized(
            "token expired".to_string(),
        ));
        let err: Error = client_err.into();

        assert!(err.source.is_some());
        assert!(err.to_string().contains("token expired"));
    }
}

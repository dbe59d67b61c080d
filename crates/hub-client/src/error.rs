//! Error types for hub API operations.

use std::time::Duration;

/// Result type alias for hub client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error returned by hub client operations.
///
/// Carries a classified [`ErrorKind`] plus the underlying source error when
/// one exists (e.g. the originating `reqwest::Error`).
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

    /// Create an error with an underlying source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Whether retrying the request could plausibly succeed.
    ///
    /// Rate limits, transient server errors, timeouts, and connection
    /// failures are retryable. Client-side errors (auth, not-found, bad
    /// configuration) are not.
    pub fn is_retryable(&self) -> bool {
        match &self.kind {
            ErrorKind::RateLimited { .. } => true,
            ErrorKind::Timeout => true,
            ErrorKind::Connection(_) => true,
            ErrorKind::Http { status, .. } => matches!(status, 500 | 502 | 503 | 504),
            _ => false,
        }
    }

    /// Whether the error is a rate-limit rejection.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self.kind, ErrorKind::RateLimited { .. })
    }

    /// Whether the error indicates bad or expired credentials.
    pub fn is_auth_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Unauthorized(_))
    }

    /// Server-requested backoff, if the response carried one.
    pub fn retry_after(&self) -> Option<Duration> {
        match &self.kind {
            ErrorKind::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// HTTP error response that fits no more specific category.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body or a short description.
        message: String,
    },

    /// The service throttled the request (HTTP 429).
    #[error("rate limited{}", retry_after.map(|d| format!(" (retry after {}s)", d.as_secs())).unwrap_or_default())]
    RateLimited {
        /// Backoff requested via the `Retry-After` header, if present.
        retry_after: Option<Duration>,
    },

    /// Authentication failed (HTTP 401). The SAS token is likely expired
    /// or malformed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The token authenticated but lacks permission (HTTP 403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The requested resource does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,

    /// The connection could not be established or was dropped.
    #[error("connection error: {0}")]
    Connection(String),

    /// A body could not be serialized or deserialized as JSON.
    #[error("JSON error: {0}")]
    Json(String),

    /// Client-side configuration is invalid (bad host, empty token, ...).
    #[error("configuration error: {0}")]
    Config(String),

    /// Structured error reported by the hub service itself.
    #[error("hub error {error_code}: {message}")]
    Hub {
        /// Service error code, e.g. `DeviceNotFound` or `InvalidProtocolVersion`.
        error_code: String,
        /// Human-readable detail, sanitized of credentials.
        message: String,
    },

    /// Every configured retry attempt failed.
    #[error("all {attempts} retry attempts exhausted")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
    },

    /// Anything that fits no other category.
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_connect() {
            ErrorKind::Connection(err.to_string())
        } else if err.is_decode() {
            ErrorKind::Json(err.to_string())
        } else if let Some(status) = err.status() {
            ErrorKind::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ErrorKind::Other(err.to_string())
        };
        Self::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::with_source(ErrorKind::Config(format!("invalid URL: {err}")), err)
    }
}

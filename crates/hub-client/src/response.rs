//! HTTP response handling with hub-specific extensions.

use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::{Error, ErrorKind, Result};
use crate::{CONTINUATION_HEADER, ITEM_TYPE_HEADER, REQUEST_ID_HEADER};

/// Wrapper around an HTTP response with hub-specific accessors.
#[derive(Debug)]
pub struct Response {
    inner: reqwest::Response,
}

impl Response {
    /// Create a new Response from a reqwest::Response.
    pub(crate) fn new(inner: reqwest::Response) -> Self {
        Self { inner }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.inner.status().as_u16()
    }

    /// Returns true if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        let status = self.status();
        (200..300).contains(&status)
    }

    /// Get a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name)?.to_str().ok()
    }

    /// Continuation token for the next page of a paged query, if any.
    ///
    /// Carried in the `x-ms-continuation` header. Absent (or empty) on the
    /// last page.
    pub fn continuation(&self) -> Option<&str> {
        self.header(CONTINUATION_HEADER)
    }

    /// Item-type tag classifying the entities in a query page, from the
    /// `x-ms-item-type` header.
    pub fn item_type(&self) -> Option<&str> {
        self.header(ITEM_TYPE_HEADER)
    }

    /// Server-assigned request id, useful when filing support requests.
    pub fn request_id(&self) -> Option<&str> {
        self.header(REQUEST_ID_HEADER)
    }

    /// Get the Retry-After header as a Duration.
    pub fn retry_after(&self) -> Option<Duration> {
        let value = self.header("retry-after")?;

        // The hub sends Retry-After in seconds; the HTTP-date form is not
        // used by this service.
        if let Ok(seconds) = value.parse::<u64>() {
            return Some(Duration::from_secs(seconds));
        }

        None
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Get the response body as text.
    pub async fn text(self) -> Result<String> {
        self.inner.text().await.map_err(Into::into)
    }

    /// Get the response body as bytes.
    pub async fn bytes(self) -> Result<bytes::Bytes> {
        self.inner.bytes().await.map_err(Into::into)
    }

    /// Deserialize the response body as JSON.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        self.inner.json().await.map_err(Into::into)
    }

    /// Get access to the inner reqwest::Response.
    pub fn into_inner(self) -> reqwest::Response {
        self.inner
    }
}

/// Extension trait for processing hub API responses.
pub trait ResponseExt {
    /// Check for hub API errors and convert to the appropriate error type.
    fn check_hub_error(self) -> impl std::future::Future<Output = Result<Response>> + Send;
}

impl ResponseExt for Response {
    async fn check_hub_error(self) -> Result<Response> {
        let status = self.status();

        if self.is_success() {
            return Ok(self);
        }

        let body = self.text().await.unwrap_or_default();
        Err(parse_error_response(status, &body))
    }
}

/// Parse an error response body and convert it to the appropriate error kind.
fn parse_error_response(status: u16, body: &str) -> Error {
    // Check for rate limiting
    if status == 429 {
        return Error::new(ErrorKind::RateLimited { retry_after: None });
    }

    // Try to parse as a hub error payload. The service reports errors as
    //   {"Message": "ErrorCode:DeviceNotFound;<detail>", "ExceptionMessage": "..."}
    if let Ok(err) = serde_json::from_str::<HubErrorResponse>(body) {
        if let Some((error_code, detail)) = err.split_error_code() {
            return Error::new(ErrorKind::Hub {
                error_code: error_code.to_string(),
                message: sanitize_error_message(detail),
            });
        }
    }

    // Map status codes to error kinds - use sanitized messages to avoid
    // exposing credentials echoed back in response bodies
    let sanitized = sanitize_error_message(body);
    let kind = match status {
        401 => ErrorKind::Unauthorized(sanitized),
        403 => ErrorKind::Forbidden(sanitized),
        404 => ErrorKind::NotFound(sanitized),
        _ => ErrorKind::Http {
            status,
            message: sanitized,
        },
    };

    Error::new(kind)
}

/// Sanitize an error message to prevent exposing credentials.
///
/// This function:
/// - Redacts SAS signatures (`sig=...`)
/// - Redacts shared access keys from echoed connection strings
/// - Truncates messages longer than 500 characters
fn sanitize_error_message(message: &str) -> String {
    const MAX_LENGTH: usize = 500;

    let mut sanitized = message.to_string();

    // The signature is the secret part of a SAS token; the service sometimes
    // echoes the full Authorization value back in 401 bodies.
    let sig_pattern = regex_lite::Regex::new(r#"sig=[^&\s"]+"#).unwrap();
    sanitized = sig_pattern.replace_all(&sanitized, "sig=[REDACTED]").to_string();

    // Connection strings carry the primary key as SharedAccessKey=<base64>.
    let key_pattern = regex_lite::Regex::new(r#"SharedAccessKey=[^;\s"]+"#).unwrap();
    sanitized = key_pattern
        .replace_all(&sanitized, "SharedAccessKey=[REDACTED]")
        .to_string();

    // Truncate if too long. The cap may land inside a multi-byte character,
    // so back up to the nearest boundary first.
    if sanitized.len() > MAX_LENGTH {
        let mut cut = MAX_LENGTH;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str("...[truncated]");
    }

    sanitized
}

/// Hub API error response format.
#[derive(Debug, serde::Deserialize)]
struct HubErrorResponse {
    #[serde(rename = "Message")]
    message: String,
    #[serde(rename = "ExceptionMessage", default)]
    exception_message: Option<String>,
}

impl HubErrorResponse {
    /// Split `"ErrorCode:<code>;<detail>"` into its parts. Falls back to the
    /// exception message when the detail segment is empty.
    fn split_error_code(&self) -> Option<(&str, &str)> {
        let rest = self.message.strip_prefix("ErrorCode:")?;
        let (code, detail) = match rest.split_once(';') {
            Some((code, detail)) => (code, detail),
            None => (rest, ""),
        };
        if detail.is_empty() {
            if let Some(ref exception) = self.exception_message {
                return Some((code, exception));
            }
        }
        Some((code, detail))
    }
}

//! Query classification types.

use std::fmt;

/// The kind of entity a query targets.
///
/// The service echoes this classification back in the `x-ms-item-type`
/// header of every page, and the paging engine rejects pages whose tag does
/// not match the type the query was created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    /// Device twin documents.
    Twin,
    /// Scheduled device job records.
    DeviceJob,
    /// Job execution responses.
    JobResponse,
    /// Raw records, e.g. aggregation results from `GROUP BY` queries.
    Raw,
    /// Sentinel for unrecognized tags. Never valid when creating a query.
    Unknown,
}

impl QueryType {
    /// The tag used on the wire for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Twin => "twin",
            QueryType::DeviceJob => "deviceJob",
            QueryType::JobResponse => "jobResponse",
            QueryType::Raw => "raw",
            QueryType::Unknown => "unknown",
        }
    }

    /// Parse a wire tag, case-insensitively.
    ///
    /// Unrecognized tags (including `"unknown"` itself) parse as
    /// [`QueryType::Unknown`].
    pub fn from_wire(tag: &str) -> QueryType {
        for candidate in [
            QueryType::Twin,
            QueryType::DeviceJob,
            QueryType::JobResponse,
            QueryType::Raw,
        ] {
            if candidate.as_str().eq_ignore_ascii_case(tag) {
                return candidate;
            }
        }
        QueryType::Unknown
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

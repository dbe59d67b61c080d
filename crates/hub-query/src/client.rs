//! Typed query entry points over the hub service.

use std::time::Duration;

use devicehub_client::{ClientConfig, HubServiceClient, RequestMethod};

use crate::collection::{QueryCollection, QuerySpec, QueryTarget, DEFAULT_FETCH_TIMEOUT};
use crate::error::{Error, Result};
use crate::types::QueryType;

/// Page size used when the caller does not choose one.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Typed query surface of the hub service.
///
/// A thin layer over [`HubServiceClient`] that knows the query endpoints
/// and the item type each of them serves, handing back ready-to-drive
/// [`QueryCollection`]s.
#[derive(Debug, Clone)]
pub struct QueryClient {
    client: HubServiceClient,
    fetch_timeout: Duration,
}

impl QueryClient {
    /// Create a query client for the given hub host and SAS token.
    pub fn new(host: impl Into<String>, sas_token: impl Into<String>) -> Result<Self> {
        Self::with_config(host, sas_token, ClientConfig::default())
    }

    /// Create a query client with custom HTTP configuration.
    pub fn with_config(
        host: impl Into<String>,
        sas_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        // Host and token problems are argument errors here, not transport
        // ones: nothing has gone on the wire yet.
        let client = HubServiceClient::with_config(host, sas_token, config)
            .map_err(|e| Error::invalid_argument(e.to_string()))?;
        Ok(Self::from_service_client(client))
    }

    /// Wrap an existing service client.
    pub fn from_service_client(client: HubServiceClient) -> Self {
        Self {
            client,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Set the per-fetch timeout used by collections this client creates.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// The underlying service client.
    pub fn inner(&self) -> &HubServiceClient {
        &self.client
    }

    /// Query device twins with SQL-style text.
    ///
    /// Pages arrive tagged `twin`. Uses the default page size; see
    /// [`query_twins_with_page_size`](Self::query_twins_with_page_size).
    pub fn query_twins(&self, sql: impl Into<String>) -> Result<QueryCollection> {
        self.query_twins_with_page_size(sql, DEFAULT_PAGE_SIZE)
    }

    /// Query device twins with an explicit page size.
    pub fn query_twins_with_page_size(
        &self,
        sql: impl Into<String>,
        page_size: u32,
    ) -> Result<QueryCollection> {
        self.sql_collection(sql.into(), page_size, QueryType::Twin)
    }

    /// Run a raw SQL-style query, e.g. an aggregation with `GROUP BY`.
    ///
    /// Pages arrive tagged `raw`; their payload shape depends entirely on
    /// the query text.
    pub fn query_raw(&self, sql: impl Into<String>) -> Result<QueryCollection> {
        self.query_raw_with_page_size(sql, DEFAULT_PAGE_SIZE)
    }

    /// Raw query with an explicit page size.
    pub fn query_raw_with_page_size(
        &self,
        sql: impl Into<String>,
        page_size: u32,
    ) -> Result<QueryCollection> {
        self.sql_collection(sql.into(), page_size, QueryType::Raw)
    }

    /// Query scheduled device jobs with SQL-style text.
    ///
    /// Pages arrive tagged `deviceJob`.
    pub fn query_device_jobs(&self, sql: impl Into<String>) -> Result<QueryCollection> {
        self.query_device_jobs_with_page_size(sql, DEFAULT_PAGE_SIZE)
    }

    /// Device-job query with an explicit page size.
    pub fn query_device_jobs_with_page_size(
        &self,
        sql: impl Into<String>,
        page_size: u32,
    ) -> Result<QueryCollection> {
        self.sql_collection(sql.into(), page_size, QueryType::DeviceJob)
    }

    /// List job execution responses, optionally filtered by type and
    /// status.
    ///
    /// This is a typed listing: the request carries no body, and the
    /// filter travels as URL parameters. Pages arrive tagged `jobResponse`.
    pub fn query_job_responses(&self, filter: &JobResponseFilter) -> Result<QueryCollection> {
        self.query_job_responses_with_page_size(filter, DEFAULT_PAGE_SIZE)
    }

    /// Job-response listing with an explicit page size.
    pub fn query_job_responses_with_page_size(
        &self,
        filter: &JobResponseFilter,
        page_size: u32,
    ) -> Result<QueryCollection> {
        let target = QueryTarget::new(self.jobs_query_url(filter), RequestMethod::Get)
            .with_timeout(self.fetch_timeout);
        QueryCollection::new(
            self.client.clone(),
            target,
            QuerySpec::Typed,
            page_size,
            QueryType::JobResponse,
        )
    }

    fn sql_collection(
        &self,
        sql: String,
        page_size: u32,
        query_type: QueryType,
    ) -> Result<QueryCollection> {
        let target = QueryTarget::new(
            self.client.service_url("devices/query"),
            RequestMethod::Post,
        )
        .with_timeout(self.fetch_timeout);
        QueryCollection::new(
            self.client.clone(),
            target,
            QuerySpec::Sql(sql),
            page_size,
            query_type,
        )
    }

    fn jobs_query_url(&self, filter: &JobResponseFilter) -> String {
        // service_url already appends ?api-version=..., so filters chain
        // with '&'.
        let mut url = self.client.service_url("jobs/v2/query");
        if let Some(ref job_type) = filter.job_type {
            url.push_str("&jobType=");
            url.push_str(&urlencoding::encode(job_type));
        }
        if let Some(ref job_status) = filter.job_status {
            url.push_str("&jobStatus=");
            url.push_str(&urlencoding::encode(job_status));
        }
        url
    }
}

/// Filter for job-response listings. The empty filter lists everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobResponseFilter {
    /// Restrict to one job type, e.g. `scheduleUpdateTwin`.
    pub job_type: Option<String>,
    /// Restrict to one job status, e.g. `completed`.
    pub job_status: Option<String>,
}

impl JobResponseFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict results to the given job type.
    pub fn with_job_type(mut self, job_type: impl Into<String>) -> Self {
        self.job_type = Some(job_type.into());
        self
    }

    /// Restrict results to the given job status.
    pub fn with_job_status(mut self, job_status: impl Into<String>) -> Self {
        self.job_status = Some(job_status.into());
        self
    }
}

//! # PostgREST Client
//!
//! Thin reqwest wrapper for the remote tabular data source: `select`
//! projections, filter predicates, exact-count range pagination and stored
//! procedure calls.
//!
//! One client is constructed at process start and shared by reference; it
//! owns no state beyond the connection pool inside [`reqwest::Client`].

use crate::infrastructure::error::{RemoteError, RemoteResult};
use crate::infrastructure::postgrest::query::RowRange;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One fetched page plus the exact total reported by the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Rows of this page.
    pub rows: Vec<T>,
    /// Total matching rows across all pages; 0 when the source did not
    /// report a count.
    pub total: u64,
}

/// Client for a PostgREST-style REST data source.
#[derive(Debug, Clone)]
pub struct PostgrestClient {
    http: reqwest::Client,
    base_url: String,
}

impl PostgrestClient {
    /// Creates a client for the given base URL and service key.
    ///
    /// The key is sent both as `apikey` and as a bearer token, the way
    /// PostgREST deployments behind an API gateway expect.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Configuration`] when the key is not a valid
    /// header value or the underlying client cannot be built.
    pub fn new(base_url: impl Into<String>, service_key: &str) -> RemoteResult<Self> {
        let mut headers = HeaderMap::new();
        let key_value = HeaderValue::from_str(service_key)
            .map_err(|_| RemoteError::configuration("service key is not a valid header value"))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {service_key}"))
            .map_err(|_| RemoteError::configuration("service key is not a valid header value"))?;
        headers.insert("apikey", key_value);
        headers.insert(reqwest::header::AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| RemoteError::configuration(format!("failed to build client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetches rows from a table or view.
    ///
    /// When `range` is given the request carries `Range-Unit: items` and an
    /// inclusive `Range` header; `count_exact` asks the source for the exact
    /// total, returned through the `Content-Range` response header.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] on transport failure, non-2xx status or an
    /// undecodable body.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(String, String)],
        range: Option<RowRange>,
        count_exact: bool,
    ) -> RemoteResult<Page<T>> {
        let url = format!("{}/rest/v1/{table}", self.base_url);
        let mut request = self.http.get(&url).query(params);

        if count_exact {
            request = request.header("Prefer", "count=exact");
        }
        if let Some(range) = range {
            request = request
                .header("Range-Unit", "items")
                .header("Range", range.header_value());
        }

        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::from_reqwest(&e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::from_status(status.as_u16(), body));
        }

        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .map(parse_content_range_total)
            .unwrap_or(0);

        let rows = response
            .json::<Vec<T>>()
            .await
            .map_err(|e| RemoteError::protocol(format!("failed to decode rows: {e}")))?;

        Ok(Page { rows, total })
    }

    /// Calls a remote stored procedure with a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] on transport failure, non-2xx status or an
    /// undecodable body.
    pub async fn rpc<T: DeserializeOwned, P: Serialize>(
        &self,
        function: &str,
        payload: &P,
    ) -> RemoteResult<T> {
        let url = format!("{}/rest/v1/rpc/{function}", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| RemoteError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::from_status(status.as_u16(), body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::protocol(format!("failed to decode rpc result: {e}")))
    }

    /// Inserts or merges one row (`Prefer: resolution=merge-duplicates`).
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] on transport failure or non-2xx status.
    pub async fn upsert<P: Serialize>(&self, table: &str, row: &P) -> RemoteResult<()> {
        let url = format!("{}/rest/v1/{table}", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("Prefer", "resolution=merge-duplicates")
            .json(row)
            .send()
            .await
            .map_err(|e| RemoteError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::from_status(status.as_u16(), body));
        }
        Ok(())
    }
}

/// Parses the total out of a `Content-Range` header (`"<start>-<end>/<total>"`).
///
/// Missing, empty or garbled headers parse to 0 rather than failing the
/// whole response.
#[must_use]
pub fn parse_content_range_total(content_range: &str) -> u64 {
    content_range
        .rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP client for the PostgREST data service.
//!
//! Every call that acts for a user forwards that user's access token, so
//! the data service evaluates row-level security as the caller. Public reads
//! go out without a token and fall under the anonymous read policy.

use std::time::Duration;

use reqwest::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE, RANGE},
    Client, RequestBuilder, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use url::Url;

use super::pagination::{extract_total, PageRequest, PageResult};
use super::query::Query;

/// Default timeout for data-service calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const PREFER: &str = "Prefer";
const API_KEY: &str = "apikey";
const REST_PATH: &str = "rest/v1/";

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("data service request timed out")]
    Timeout,

    #[error("data service unreachable: {0}")]
    Unavailable(String),

    #[error("data service returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("data service response was invalid: {0}")]
    InvalidResponse(String),

    #[error("refusing to delete without a filter")]
    MissingFilter,
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else if err.is_decode() {
            UpstreamError::InvalidResponse(err.to_string())
        } else {
            UpstreamError::Unavailable(err.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct DataServiceClient {
    rest_url: Url,
    anon_key: Option<String>,
    http: Client,
}

impl DataServiceClient {
    /// Create a client for the project at `base_url`; requests go to
    /// `<base_url>/rest/v1/<resource>`.
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(base_url, http))
    }

    pub fn with_client(base_url: &Url, http: Client) -> Self {
        let mut root = base_url.clone();
        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }
        // `join` only fails on malformed relative input; REST_PATH is constant.
        let rest_url = root.join(REST_PATH).unwrap_or(root);
        Self {
            rest_url,
            anon_key: None,
            http,
        }
    }

    /// Send `apikey: <key>` on every request.
    pub fn with_anon_key(mut self, anon_key: Option<String>) -> Self {
        self.anon_key = anon_key.filter(|k| !k.is_empty());
        self
    }

    pub fn rest_url(&self) -> &Url {
        &self.rest_url
    }

    /// One page of `resource`, with the exact total when upstream reports it.
    pub async fn list<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &Query,
        page: PageRequest,
        token: Option<&str>,
    ) -> Result<PageResult<T>, UpstreamError> {
        let response = self
            .request(reqwest::Method::GET, resource, token)
            .query(&query.to_params())
            .header(RANGE, page.range_header())
            .header(PREFER, "count=exact")
            .send()
            .await?;
        let response = check_status(resource, response).await?;

        let total = extract_total(
            response
                .headers()
                .get(CONTENT_RANGE)
                .and_then(|v| v.to_str().ok()),
        );
        let items: Vec<T> = decode_body(response).await?.unwrap_or_default();
        Ok(PageResult::new(items, page, total))
    }

    /// Rows of `resource` matching `query`, without range pagination.
    pub async fn select<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &Query,
        token: Option<&str>,
    ) -> Result<Vec<T>, UpstreamError> {
        let response = self
            .request(reqwest::Method::GET, resource, token)
            .query(&query.to_params())
            .send()
            .await?;
        let response = check_status(resource, response).await?;
        Ok(decode_body(response).await?.unwrap_or_default())
    }

    /// Insert one row and return the stored record.
    ///
    /// PostgREST answers with a one-element array; the element is unwrapped.
    pub async fn create<B: Serialize + ?Sized>(
        &self,
        resource: &str,
        token: &str,
        body: &B,
    ) -> Result<Value, UpstreamError> {
        let response = self
            .request(reqwest::Method::POST, resource, Some(token))
            .header(PREFER, "return=representation")
            .json(body)
            .send()
            .await?;
        let response = check_status(resource, response).await?;

        match decode_body::<Value>(response).await? {
            Some(Value::Array(rows)) => rows.into_iter().next().ok_or_else(|| {
                UpstreamError::InvalidResponse(format!("{resource}: insert returned no rows"))
            }),
            Some(row) => Ok(row),
            None => Err(UpstreamError::InvalidResponse(format!(
                "{resource}: insert returned an empty body"
            ))),
        }
    }

    /// Insert one row without asking for it back.
    pub async fn insert<B: Serialize + ?Sized>(
        &self,
        resource: &str,
        token: &str,
        body: &B,
    ) -> Result<(), UpstreamError> {
        let response = self
            .request(reqwest::Method::POST, resource, Some(token))
            .header(PREFER, "return=minimal")
            .json(body)
            .send()
            .await?;
        check_status(resource, response).await?;
        Ok(())
    }

    /// Insert, or merge into the row that conflicts on `on_conflict`.
    ///
    /// Requires a unique constraint over `on_conflict` upstream.
    pub async fn upsert<B: Serialize + ?Sized>(
        &self,
        resource: &str,
        token: &str,
        on_conflict: &[&str],
        body: &B,
    ) -> Result<(), UpstreamError> {
        let response = self
            .request(reqwest::Method::POST, resource, Some(token))
            .query(&[("on_conflict", on_conflict.join(","))])
            .header(PREFER, "resolution=merge-duplicates,return=minimal")
            .json(body)
            .send()
            .await?;
        check_status(resource, response).await?;
        Ok(())
    }

    /// Delete every row of `resource` matching `query`.
    pub async fn delete_by_filter(
        &self,
        resource: &str,
        token: &str,
        query: &Query,
    ) -> Result<(), UpstreamError> {
        if !query.has_filters() {
            return Err(UpstreamError::MissingFilter);
        }
        let response = self
            .request(reqwest::Method::DELETE, resource, Some(token))
            .query(&query.to_params())
            .send()
            .await?;
        check_status(resource, response).await?;
        Ok(())
    }

    fn request(&self, method: reqwest::Method, resource: &str, token: Option<&str>) -> RequestBuilder {
        let mut url = self.rest_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(resource.trim_matches('/'));
        }

        let mut builder = self
            .http
            .request(method, url)
            .header(ACCEPT, "application/json");
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(anon_key) = &self.anon_key {
            builder = builder.header(API_KEY, anon_key);
        }
        builder
    }
}

async fn check_status(resource: &str, response: Response) -> Result<Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(
        resource,
        status = status.as_u16(),
        body = %body,
        "data service returned an error"
    );
    Err(UpstreamError::Status { status, body })
}

/// Decode a JSON body; `None` for an empty body (e.g. `204 No Content`).
async fn decode_body<T: DeserializeOwned>(response: Response) -> Result<Option<T>, UpstreamError> {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("json"))
        .unwrap_or(true);
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok(None);
    }
    if !is_json {
        return Err(UpstreamError::InvalidResponse(
            "expected a JSON response".to_string(),
        ));
    }
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))
}

//! Course service client.
//!
//! [`CourseClient`] is the raw HTTP read. [`ResilientCourseClient`] puts it
//! behind a shared [`CircuitBreaker`] and turns every failure into an empty
//! page, so callers never observe the course service being down.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use common::HttpClientConfig;
use domain::{CourseRecord, Page, PageRequest, Sort, DEFAULT_COURSE_SORT_FIELD};

use crate::resilience::CircuitBreaker;

const COURSES_PATH: &str = "/api/v1/courses";

/// Failure reaching or reading from the course service.
#[derive(Debug, Error)]
pub enum DownstreamError {
    #[error("course service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("course service responded with {0}")]
    Status(StatusCode),
}

/// Page envelope returned by the course service
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemotePage {
    #[serde(default)]
    content: Vec<CourseRecord>,
    #[serde(default)]
    total_elements: u64,
}

#[derive(Debug, Clone)]
pub struct CourseClient {
    client: Client,
    base_url: String,
}

impl CourseClient {
    /// Build a client with the configured connect and request timeouts.
    pub fn new(config: &HttpClientConfig) -> Result<Self, DownstreamError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One page of the courses `account_id` is enrolled in.
    pub async fn fetch_courses(
        &self,
        account_id: Uuid,
        request: &PageRequest,
    ) -> Result<Page<CourseRecord>, DownstreamError> {
        let sort = request
            .sort
            .clone()
            .unwrap_or_else(|| Sort::asc(DEFAULT_COURSE_SORT_FIELD));
        let url = format!("{}{}", self.base_url, COURSES_PATH);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("userId", account_id.to_string()),
                ("page", request.page.to_string()),
                ("size", request.size.to_string()),
                ("sort", sort.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownstreamError::Status(status));
        }

        let body: RemotePage = response.json().await?;
        debug!(
            account_id = %account_id,
            count = body.content.len(),
            total = body.total_elements,
            "Fetched courses"
        );
        Ok(Page::new(body.content, request, body.total_elements))
    }
}

/// Course client guarded by a circuit breaker.
pub struct ResilientCourseClient {
    client: CourseClient,
    breaker: Arc<CircuitBreaker>,
}

impl ResilientCourseClient {
    pub fn new(client: CourseClient, breaker: Arc<CircuitBreaker>) -> Self {
        Self { client, breaker }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Courses for `account_id`, or an empty page when the course service
    /// fails or the breaker is open.
    pub async fn courses_for_account(
        &self,
        account_id: Uuid,
        request: &PageRequest,
    ) -> Page<CourseRecord> {
        self.breaker
            .call(
                || self.client.fetch_courses(account_id, request),
                || Page::empty(request),
            )
            .await
    }
}

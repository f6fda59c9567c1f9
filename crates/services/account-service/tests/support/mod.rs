//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use parking_lot::Mutex;
use serde_json::json;

use account_service_lib::api::AppState;
use account_service_lib::config::AccountServiceConfig;
use account_service_lib::events::EventEmitter;
use account_service_lib::repository::{
    AccountRepository, InMemoryAccountStore, SubscriptionRepository,
};
use common::{AppError, AppResult};
use domain::{AccountEvent, NewAccount};

pub const STUB_COURSE_ID: &str = "6f1c1a52-3c55-4c8e-9a34-1f0d8b1f2a77";

/// Event emitter that records what it is given and can be told to fail.
#[derive(Default)]
pub struct RecordingEmitter {
    events: Mutex<Vec<AccountEvent>>,
    failures_left: AtomicUsize,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` publishes
    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<AccountEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl EventEmitter for RecordingEmitter {
    async fn publish(&self, event: &AccountEvent) -> AppResult<()> {
        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(AppError::publish_failure("simulated bus outage"));
        }

        self.events.lock().push(event.clone());
        Ok(())
    }
}

pub fn registration(username: &str) -> NewAccount {
    NewAccount {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        full_name: format!("{} Example", username),
        phone_number: None,
        national_id: None,
        image_url: None,
    }
}

/// Configuration pointing the course client at `course_url` with short timeouts.
pub fn test_config(course_url: &str) -> AccountServiceConfig {
    let mut config = AccountServiceConfig::default();
    config.course_service.endpoint = course_url.to_string();
    config.course_service.connect_timeout_ms = 200;
    config.course_service.request_timeout_ms = 500;
    config
}

/// Service graph over an in-memory store and a recording emitter.
pub struct Harness {
    pub store: Arc<InMemoryAccountStore>,
    pub emitter: Arc<RecordingEmitter>,
    pub state: AppState,
}

impl Harness {
    pub fn new(course_url: &str) -> Self {
        let store = Arc::new(InMemoryAccountStore::new());
        let emitter = Arc::new(RecordingEmitter::new());
        let repo: Arc<dyn AccountRepository> = store.clone();
        let subscriptions: Arc<dyn SubscriptionRepository> = store.clone();
        let state = account_service_lib::build_state(
            repo,
            subscriptions,
            emitter.clone(),
            &test_config(course_url),
        )
        .expect("state builds");

        Self {
            store,
            emitter,
            state,
        }
    }

    /// Course service that refuses connections
    pub fn offline() -> Self {
        Self::new("http://127.0.0.1:1")
    }
}

/// Minimal course service answering `GET /api/v1/courses`.
#[derive(Default)]
pub struct CourseStub {
    pub hits: AtomicUsize,
    pub failing: AtomicBool,
    pub last_query: Mutex<Option<HashMap<String, String>>>,
}

impl CourseStub {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

async fn stub_courses(
    State(stub): State<Arc<CourseStub>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    stub.hits.fetch_add(1, Ordering::SeqCst);
    *stub.last_query.lock() = Some(params);

    if stub.failing.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    Json(json!({
        "content": [{
            "courseId": STUB_COURSE_ID,
            "name": "Rust for Services",
            "description": "Ownership, async and axum",
            "courseStatus": "INPROGRESS",
            "courseLevel": "BEGINNER"
        }],
        "totalElements": 1,
        "totalPages": 1,
        "number": 0
    }))
    .into_response()
}

/// Start a course stub on an ephemeral port; returns its base URL.
pub async fn spawn_course_stub(stub: Arc<CourseStub>) -> String {
    let app = Router::new()
        .route("/api/v1/courses", get(stub_courses))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });

    format!("http://{}", addr)
}

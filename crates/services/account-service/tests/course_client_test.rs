//! Course client against a stub course service.

mod support;

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use uuid::Uuid;

use account_service_lib::clients::{CourseClient, DownstreamError, ResilientCourseClient};
use account_service_lib::resilience::{BreakerSettings, CircuitBreaker, CircuitState};
use common::HttpClientConfig;
use domain::{PageRequest, Sort, SortDirection};
use support::{spawn_course_stub, CourseStub, STUB_COURSE_ID};

fn client_for(endpoint: &str) -> CourseClient {
    CourseClient::new(&HttpClientConfig {
        endpoint: endpoint.to_string(),
        connect_timeout_ms: 200,
        request_timeout_ms: 1000,
    })
    .unwrap()
}

fn resilient(endpoint: &str, failure_threshold: u32, cooldown: Duration) -> ResilientCourseClient {
    let breaker = Arc::new(CircuitBreaker::new(
        "course-service",
        BreakerSettings {
            failure_threshold,
            cooldown,
            call_timeout: None,
        },
    ));
    ResilientCourseClient::new(client_for(endpoint), breaker)
}

#[tokio::test]
async fn test_fetch_sends_paging_and_decodes_page() {
    let stub = Arc::new(CourseStub::default());
    let url = spawn_course_stub(stub.clone()).await;
    let account_id = Uuid::new_v4();

    let page = client_for(&url)
        .fetch_courses(account_id, &PageRequest::new(2, 5).unwrap())
        .await
        .unwrap();

    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0].course_id.to_string(), STUB_COURSE_ID);
    assert_eq!(page.content[0].course_level.as_deref(), Some("BEGINNER"));
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.number, 2);
    assert_eq!(page.size, 5);

    let query = stub.last_query.lock().clone().unwrap();
    assert_eq!(query["userId"], account_id.to_string());
    assert_eq!(query["page"], "2");
    assert_eq!(query["size"], "5");
    assert_eq!(query["sort"], "courseId,ASC");
}

#[tokio::test]
async fn test_fetch_forwards_caller_sort() {
    let stub = Arc::new(CourseStub::default());
    let url = spawn_course_stub(stub.clone()).await;

    let request = PageRequest::default().with_sort(Sort::new("name", SortDirection::Desc));
    client_for(&url)
        .fetch_courses(Uuid::new_v4(), &request)
        .await
        .unwrap();

    let query = stub.last_query.lock().clone().unwrap();
    assert_eq!(query["sort"], "name,DESC");
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let stub = Arc::new(CourseStub::default());
    stub.set_failing(true);
    let url = spawn_course_stub(stub.clone()).await;

    let result = client_for(&url)
        .fetch_courses(Uuid::new_v4(), &PageRequest::default())
        .await;

    assert!(matches!(
        result,
        Err(DownstreamError::Status(StatusCode::INTERNAL_SERVER_ERROR))
    ));
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    let result = client_for("http://127.0.0.1:1")
        .fetch_courses(Uuid::new_v4(), &PageRequest::default())
        .await;

    assert!(matches!(result, Err(DownstreamError::Transport(_))));
}

#[tokio::test]
async fn test_open_breaker_stops_calling_course_service() {
    let stub = Arc::new(CourseStub::default());
    stub.set_failing(true);
    let url = spawn_course_stub(stub.clone()).await;
    let courses = resilient(&url, 5, Duration::from_secs(60));
    let request = PageRequest::default();

    for _ in 0..7 {
        let page = courses.courses_for_account(Uuid::new_v4(), &request).await;
        assert!(page.is_empty());
        assert_eq!(page.total_elements, 0);
    }

    assert_eq!(stub.hits(), 5);
    assert_eq!(courses.breaker().state(), CircuitState::Open);
}

#[tokio::test]
async fn test_breaker_recovers_after_cooldown() {
    let stub = Arc::new(CourseStub::default());
    stub.set_failing(true);
    let url = spawn_course_stub(stub.clone()).await;
    let courses = resilient(&url, 1, Duration::from_millis(200));
    let request = PageRequest::default();

    assert!(courses
        .courses_for_account(Uuid::new_v4(), &request)
        .await
        .is_empty());
    assert_eq!(courses.breaker().state(), CircuitState::Open);

    stub.set_failing(false);
    tokio::time::sleep(Duration::from_millis(250)).await;

    let page = courses.courses_for_account(Uuid::new_v4(), &request).await;
    assert_eq!(page.content.len(), 1);
    assert_eq!(courses.breaker().state(), CircuitState::Closed);
    assert_eq!(stub.hits(), 2);
}

#[tokio::test]
async fn test_unreachable_service_falls_back_to_empty_page() {
    let courses = resilient("http://127.0.0.1:1", 5, Duration::from_secs(30));
    let request = PageRequest::new(1, 20).unwrap();

    let page = courses.courses_for_account(Uuid::new_v4(), &request).await;

    assert!(page.is_empty());
    assert_eq!(page.number, 1);
    assert_eq!(page.size, 20);
    assert_eq!(courses.breaker().snapshot().consecutive_failures, 1);
}

//! Courses an account is enrolled in, and course subscriptions.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use common::{AppError, AppResult};
use domain::{CourseRecord, Page, Subscription};

use super::page_request;
use crate::api::extractors::ValidatedJson;
use crate::api::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CoursePageQuery {
    pub page: Option<u64>,
    pub size: Option<u64>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    pub course_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(subscription: Subscription) -> Self {
        Self {
            id: subscription.id,
            user_id: subscription.account_id,
            course_id: subscription.course_id,
        }
    }
}

/// Create course routes (nested under the account path)
pub fn course_routes() -> Router<AppState> {
    Router::new()
        .route("/:id/courses", get(list_courses))
        .route("/:id/courses/subscription", post(subscribe))
}

/// Course page for an account; empty while the course service is unavailable
pub async fn list_courses(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    query: Result<Query<CoursePageQuery>, QueryRejection>,
) -> AppResult<Json<Page<CourseRecord>>> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let request = page_request(query.page, query.size, query.sort.as_deref())?;

    Ok(Json(state.courses.courses_for_account(id, &request).await))
}

/// Subscribe an account to a course
pub async fn subscribe(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<SubscriptionRequest>,
) -> AppResult<(StatusCode, Json<SubscriptionResponse>)> {
    let subscription = state.subscriptions.subscribe(id, req.course_id).await?;
    Ok((StatusCode::CREATED, Json(SubscriptionResponse::from(subscription))))
}

//! Health check handlers.

use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;

use crate::api::state::AppState;
use crate::resilience::CircuitState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub dependencies: Dependencies,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependencies {
    pub course_service: CircuitHealth,
}

/// Breaker view of one downstream dependency.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitHealth {
    pub circuit: CircuitState,
    pub consecutive_failures: u32,
}

/// Create health routes.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

/// Always 200: an open circuit degrades course reads to empty pages but the
/// service keeps serving.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.courses.breaker().snapshot();

    let status = if snapshot.state == CircuitState::Closed {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        dependencies: Dependencies {
            course_service: CircuitHealth {
                circuit: snapshot.state,
                consecutive_failures: snapshot.consecutive_failures,
            },
        },
    })
}

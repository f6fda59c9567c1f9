//! Route configuration.

use axum::Router;

use super::handlers::{account_routes, auth_routes, course_routes, health_routes};
use super::state::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest("/api/v1/auth", auth_routes())
        .nest("/api/v1/users", account_routes().merge(course_routes()))
        .with_state(state)
}

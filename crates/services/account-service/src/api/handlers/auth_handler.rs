//! Self-service registration.

use axum::{extract::State, http::StatusCode, response::Json, routing::post, Router};
use serde::Deserialize;
use validator::Validate;

use common::AppResult;
use domain::NewAccount;

use super::AccountResponse;
use crate::api::extractors::ValidatedJson;
use crate::api::state::AppState;

/// Registration request with validation
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 4, max = 50, message = "Username must be between 4 and 50 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, max = 150, message = "Full name cannot be empty"))]
    pub full_name: String,
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
    #[validate(length(max = 20))]
    pub cpf: Option<String>,
    pub image_url: Option<String>,
}

impl From<SignupRequest> for NewAccount {
    fn from(req: SignupRequest) -> Self {
        NewAccount {
            username: req.username,
            email: req.email,
            full_name: req.full_name,
            phone_number: req.phone_number,
            national_id: req.cpf,
            image_url: req.image_url,
        }
    }
}

/// Create auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/signup", post(signup))
}

/// Register a new account
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<AccountResponse>)> {
    tracing::debug!(username = %req.username, "Signup request received");

    let account = state.accounts.register(req.into()).await?;
    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

//! Account handlers.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use common::{AppError, AppResult};
use domain::{Account, AccountChanges, AccountStatus, AccountType, FilterSpec, Page};

use super::page_request;
use crate::api::extractors::ValidatedJson;
use crate::api::state::AppState;

/// Account as returned over HTTP
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub cpf: Option<String>,
    pub image_url: Option<String>,
    pub user_status: AccountStatus,
    pub user_type: AccountType,
    pub roles: Vec<String>,
    pub creation_date: DateTime<Utc>,
    pub last_update_date: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            user_id: account.id,
            username: account.username,
            email: account.email,
            full_name: account.full_name,
            phone_number: account.phone_number,
            cpf: account.national_id,
            image_url: account.image_url,
            user_status: account.status,
            user_type: account.account_type,
            roles: account.roles.into_iter().map(|role| role.name).collect(),
            creation_date: account.created_at,
            last_update_date: account.updated_at,
        }
    }
}

/// Listing filters plus paging, as query parameters
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAccountsQuery {
    pub role_name: Option<String>,
    pub user_type: Option<AccountType>,
    pub user_status: Option<AccountStatus>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    /// Fragment of username or email
    pub search: Option<String>,
    pub page: Option<u64>,
    pub size: Option<u64>,
    pub sort: Option<String>,
}

impl ListAccountsQuery {
    fn filter(&self) -> FilterSpec {
        FilterSpec {
            role: self.role_name.clone(),
            account_type: self.user_type,
            status: self.user_status,
            created_from: self.created_from,
            created_to: self.created_to,
            text: self.search.clone(),
        }
    }
}

/// Profile update request.
///
/// Replaces the profile: an absent or null phone number or cpf clears it.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[validate(length(min = 1, max = 150, message = "Full name cannot be empty"))]
    pub full_name: String,
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
    #[validate(length(max = 20))]
    pub cpf: Option<String>,
    /// Reject the update if the account changed after this timestamp was read
    pub last_update_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateImageRequest {
    #[validate(length(min = 1, message = "Image URL cannot be empty"))]
    pub image_url: String,
    pub last_update_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub user_status: AccountStatus,
    pub last_update_date: Option<DateTime<Utc>>,
}

/// Create account routes
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_accounts))
        .route(
            "/:id",
            get(get_account).put(update_account).delete(delete_account),
        )
        .route("/:id/image", put(update_image))
        .route("/:id/status", put(update_status))
}

/// Filtered, paginated account listing
pub async fn list_accounts(
    State(state): State<AppState>,
    query: Result<Query<ListAccountsQuery>, QueryRejection>,
) -> AppResult<Json<Page<AccountResponse>>> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let page = page_request(query.page, query.size, query.sort.as_deref())?;

    let accounts = state.accounts.list_accounts(query.filter(), page).await?;
    Ok(Json(accounts.map(AccountResponse::from)))
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AccountResponse>> {
    let account = state.accounts.get_account(id).await?;
    Ok(Json(AccountResponse::from(account)))
}

/// Update full name, phone number and national id
pub async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateAccountRequest>,
) -> AppResult<Json<AccountResponse>> {
    let changes = AccountChanges {
        full_name: Some(req.full_name),
        phone_number: Some(req.phone_number),
        national_id: Some(req.cpf),
        expected_updated_at: req.last_update_date,
        ..Default::default()
    };

    let account = state.accounts.update_account(id, changes).await?;
    Ok(Json(AccountResponse::from(account)))
}

pub async fn update_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateImageRequest>,
) -> AppResult<Json<AccountResponse>> {
    let changes = AccountChanges {
        image_url: Some(req.image_url),
        expected_updated_at: req.last_update_date,
        ..Default::default()
    };

    let account = state.accounts.update_account(id, changes).await?;
    Ok(Json(AccountResponse::from(account)))
}

/// Block or unblock an account
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateStatusRequest>,
) -> AppResult<Json<AccountResponse>> {
    let changes = AccountChanges {
        status: Some(req.user_status),
        expected_updated_at: req.last_update_date,
        ..Default::default()
    };

    let account = state.accounts.update_account(id, changes).await?;
    Ok(Json(AccountResponse::from(account)))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.accounts.delete_account(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

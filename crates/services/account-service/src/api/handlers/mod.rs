//! HTTP handlers.

mod account_handler;
mod auth_handler;
mod course_handler;
mod health_handler;

pub use account_handler::{account_routes, AccountResponse};
pub use auth_handler::{auth_routes, SignupRequest};
pub use course_handler::{course_routes, SubscriptionResponse};
pub use health_handler::{health_routes, HealthResponse};

use common::AppResult;
use domain::{PageRequest, Sort, DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE};

/// Build a page request from the `page`, `size` and `sort` query parameters.
pub(crate) fn page_request(
    page: Option<u64>,
    size: Option<u64>,
    sort: Option<&str>,
) -> AppResult<PageRequest> {
    let request = PageRequest::new(
        page.unwrap_or(DEFAULT_PAGE_NUMBER),
        size.unwrap_or(DEFAULT_PAGE_SIZE),
    )?;

    match sort.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Ok(request.with_sort(Sort::parse(raw)?)),
        None => Ok(request),
    }
}

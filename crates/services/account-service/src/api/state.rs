//! Application state for dependency injection.

use std::sync::Arc;

use crate::clients::ResilientCourseClient;
use crate::service::{AccountService, SubscriptionService};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountService>,
    pub subscriptions: Arc<dyn SubscriptionService>,
    pub courses: Arc<ResilientCourseClient>,
}

impl AppState {
    pub fn new(
        accounts: Arc<dyn AccountService>,
        subscriptions: Arc<dyn SubscriptionService>,
        courses: Arc<ResilientCourseClient>,
    ) -> Self {
        Self {
            accounts,
            subscriptions,
            courses,
        }
    }
}

//! Course subscription service.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::Subscription;

use crate::repository::{AccountRepository, SubscriptionRepository};

#[async_trait]
pub trait SubscriptionService: Send + Sync {
    /// Subscribe an existing account to a course, once per course
    async fn subscribe(&self, account_id: Uuid, course_id: Uuid) -> AppResult<Subscription>;
}

pub struct SubscriptionManager {
    accounts: Arc<dyn AccountRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl SubscriptionManager {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
    ) -> Self {
        Self {
            accounts,
            subscriptions,
        }
    }
}

#[async_trait]
impl SubscriptionService for SubscriptionManager {
    async fn subscribe(&self, account_id: Uuid, course_id: Uuid) -> AppResult<Subscription> {
        if self.accounts.find_by_id(account_id).await?.is_none() {
            warn!(%account_id, "Subscription requested for unknown account");
            return Err(AppError::NotFound);
        }

        if self.subscriptions.exists(account_id, course_id).await? {
            warn!(%account_id, %course_id, "Subscription already exists");
            return Err(AppError::unprocessable("Subscription already exists"));
        }

        // The store re-checks both rules for requests racing past the reads above
        let subscription = self
            .subscriptions
            .insert(Subscription::new(account_id, course_id))
            .await?;

        info!(%account_id, %course_id, "Account subscribed to course");
        Ok(subscription)
    }
}

//! Service layer - Business logic.

mod account_service;
mod locks;
mod subscription_service;
mod unit_of_work;

pub use account_service::{AccountManager, AccountService};
pub use locks::{AccountLockGuard, AccountLocks};
pub use subscription_service::{SubscriptionManager, SubscriptionService};
pub use unit_of_work::{AccountUnitOfWork, Mutation};

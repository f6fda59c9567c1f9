//! Repository layer for data access.

mod account_repository;
pub mod entities;
mod memory;
mod subscription_repository;

pub use account_repository::{AccountRepository, AccountStore};
pub use memory::InMemoryAccountStore;
pub use subscription_repository::{SubscriptionRepository, SubscriptionStore};

#[cfg(any(test, feature = "test-utils"))]
pub use account_repository::MockAccountRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use subscription_repository::MockSubscriptionRepository;

//! In-process account store.
//!
//! Same contract as [`AccountStore`](super::AccountStore): uniqueness on
//! username and email, roles seeded up front, listings filtered through
//! [`Predicate::matches`]. Course subscriptions live in the same tables
//! and go away with their account. Used by integration tests and local
//! runs without PostgreSQL.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::subscription_repository::DUPLICATE_SUBSCRIPTION;
use super::{AccountRepository, SubscriptionRepository};
use crate::query::{AccountOrder, Predicate};
use common::{AppError, AppResult};
use domain::{Account, Page, PageRequest, Role, Subscription, VALID_ROLES};

#[derive(Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    roles: Vec<Role>,
    subscriptions: Vec<Subscription>,
}

pub struct InMemoryAccountStore {
    tables: RwLock<Tables>,
}

impl InMemoryAccountStore {
    /// Empty store holding the seeded roles
    pub fn new() -> Self {
        let roles = VALID_ROLES
            .iter()
            .map(|name| Role::new(Uuid::new_v4(), *name))
            .collect();

        Self {
            tables: RwLock::new(Tables {
                accounts: HashMap::new(),
                roles,
                subscriptions: Vec::new(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.tables.read().accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

fn clashes(existing: &Account, candidate: &Account) -> Option<&'static str> {
    if existing.id == candidate.id {
        return None;
    }
    if existing.username == candidate.username {
        Some("Username")
    } else if existing.email == candidate.email {
        Some("Email")
    } else {
        None
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        Ok(self.tables.read().accounts.get(&id).cloned())
    }

    async fn exists_by_username(&self, username: &str) -> AppResult<bool> {
        Ok(self
            .tables
            .read()
            .accounts
            .values()
            .any(|a| a.username == username))
    }

    async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
        Ok(self.tables.read().accounts.values().any(|a| a.email == email))
    }

    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        Ok(self
            .tables
            .read()
            .roles
            .iter()
            .find(|role| role.name == name)
            .cloned())
    }

    async fn insert(&self, account: Account) -> AppResult<Account> {
        let mut tables = self.tables.write();
        if tables.accounts.contains_key(&account.id) {
            return Err(AppError::conflict("Account"));
        }
        if let Some(field) = tables.accounts.values().find_map(|a| clashes(a, &account)) {
            return Err(AppError::conflict(field));
        }

        tables.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update(&self, account: Account) -> AppResult<Account> {
        let mut tables = self.tables.write();
        if !tables.accounts.contains_key(&account.id) {
            return Err(AppError::NotFound);
        }
        if let Some(field) = tables.accounts.values().find_map(|a| clashes(a, &account)) {
            return Err(AppError::conflict(field));
        }

        tables.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.write();
        if tables.accounts.remove(&id).is_none() {
            return Err(AppError::NotFound);
        }

        tables.subscriptions.retain(|s| s.account_id != id);
        Ok(())
    }

    async fn scan(&self, predicate: &Predicate, page: &PageRequest) -> AppResult<Page<Account>> {
        let order = AccountOrder::resolve(page.sort.as_ref())?;

        let mut matching: Vec<Account> = self
            .tables
            .read()
            .accounts
            .values()
            .filter(|account| predicate.matches(account))
            .cloned()
            .collect();
        matching.sort_by(|a, b| order.compare(a, b));

        let total = matching.len() as u64;
        let content = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .collect();

        Ok(Page::new(content, page, total))
    }
}

#[async_trait]
impl SubscriptionRepository for InMemoryAccountStore {
    async fn exists(&self, account_id: Uuid, course_id: Uuid) -> AppResult<bool> {
        Ok(self
            .tables
            .read()
            .subscriptions
            .iter()
            .any(|s| s.account_id == account_id && s.course_id == course_id))
    }

    async fn insert(&self, subscription: Subscription) -> AppResult<Subscription> {
        let mut tables = self.tables.write();
        if !tables.accounts.contains_key(&subscription.account_id) {
            return Err(AppError::NotFound);
        }
        let duplicate = tables.subscriptions.iter().any(|s| {
            s.account_id == subscription.account_id && s.course_id == subscription.course_id
        });
        if duplicate {
            return Err(AppError::unprocessable(DUPLICATE_SUBSCRIPTION));
        }

        tables.subscriptions.push(subscription.clone());
        Ok(subscription)
    }
}

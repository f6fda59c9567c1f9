//! Account service - Handles account-related use cases.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{
    validate_username, Account, AccountChanges, FilterSpec, NewAccount, Page, PageRequest, Sort,
    DEFAULT_ACCOUNT_SORT_FIELD, ROLE_STUDENT,
};

use super::unit_of_work::{AccountUnitOfWork, Mutation};
use crate::query;
use crate::repository::AccountRepository;

/// Account service trait for dependency injection.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Register a new account (ACTIVE, STUDENT type, STUDENT role)
    async fn register(&self, new: NewAccount) -> AppResult<Account>;

    async fn get_account(&self, id: Uuid) -> AppResult<Account>;

    /// Filtered, paginated listing. Sorts by id ascending unless told otherwise.
    async fn list_accounts(&self, filter: FilterSpec, page: PageRequest)
        -> AppResult<Page<Account>>;

    async fn update_account(&self, id: Uuid, changes: AccountChanges) -> AppResult<Account>;

    /// Delete an account, returning its last state
    async fn delete_account(&self, id: Uuid) -> AppResult<Account>;
}

/// Concrete implementation of AccountService.
///
/// Reads go straight to the repository; every write goes through the unit
/// of work so it is paired with its event.
pub struct AccountManager {
    repo: Arc<dyn AccountRepository>,
    unit_of_work: Arc<AccountUnitOfWork>,
}

impl AccountManager {
    pub fn new(repo: Arc<dyn AccountRepository>, unit_of_work: Arc<AccountUnitOfWork>) -> Self {
        Self { repo, unit_of_work }
    }
}

#[async_trait]
impl AccountService for AccountManager {
    async fn register(&self, new: NewAccount) -> AppResult<Account> {
        validate_username(&new.username)?;

        let role = self
            .repo
            .find_role_by_name(ROLE_STUDENT)
            .await?
            .ok_or_else(|| AppError::internal(format!("Role {} is not seeded", ROLE_STUDENT)))?;

        let account = Account::register(new, role);
        self.unit_of_work.apply(Mutation::Create(account)).await
    }

    async fn get_account(&self, id: Uuid) -> AppResult<Account> {
        self.repo.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    async fn list_accounts(
        &self,
        filter: FilterSpec,
        page: PageRequest,
    ) -> AppResult<Page<Account>> {
        let predicate = query::build(&filter);
        let page = page.or_sort(Sort::asc(DEFAULT_ACCOUNT_SORT_FIELD));
        self.repo.scan(&predicate, &page).await
    }

    async fn update_account(&self, id: Uuid, changes: AccountChanges) -> AppResult<Account> {
        if changes.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }
        self.unit_of_work
            .apply(Mutation::Update { id, changes })
            .await
    }

    async fn delete_account(&self, id: Uuid) -> AppResult<Account> {
        self.unit_of_work.apply(Mutation::Delete(id)).await
    }
}

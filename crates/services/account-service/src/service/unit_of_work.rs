//! Couples account mutations with the events that announce them.
//!
//! Every mutation either commits locally *and* has its event accepted by the
//! bus, or leaves no observable local change and fails with
//! [`AppError::PublishFailure`]. Create and update publish after the write
//! and compensate on failure; delete publishes first and only then removes.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{Account, AccountChanges, AccountEvent, ActionType};

use super::locks::AccountLocks;
use crate::events::EventEmitter;
use crate::repository::AccountRepository;

/// A single state change to one account.
#[derive(Debug, Clone)]
pub enum Mutation {
    Create(Account),
    Update { id: Uuid, changes: AccountChanges },
    Delete(Uuid),
}

impl Mutation {
    pub fn action_type(&self) -> ActionType {
        match self {
            Mutation::Create(_) => ActionType::Create,
            Mutation::Update { .. } => ActionType::Update,
            Mutation::Delete(_) => ActionType::Delete,
        }
    }

    pub fn account_id(&self) -> Uuid {
        match self {
            Mutation::Create(account) => account.id,
            Mutation::Update { id, .. } => *id,
            Mutation::Delete(id) => *id,
        }
    }
}

pub struct AccountUnitOfWork {
    repo: Arc<dyn AccountRepository>,
    emitter: Arc<dyn EventEmitter>,
    locks: AccountLocks,
}

impl AccountUnitOfWork {
    pub fn new(
        repo: Arc<dyn AccountRepository>,
        emitter: Arc<dyn EventEmitter>,
        locks: AccountLocks,
    ) -> Self {
        Self {
            repo,
            emitter,
            locks,
        }
    }

    /// Apply `mutation` and publish its event.
    ///
    /// Returns the committed account, or for deletes the account as it was
    /// just before removal. Mutations of the same account are serialized.
    pub async fn apply(&self, mutation: Mutation) -> AppResult<Account> {
        let _guard = self.locks.acquire(mutation.account_id()).await;

        match mutation {
            Mutation::Create(account) => self.create(account).await,
            Mutation::Update { id, changes } => self.update(id, changes).await,
            Mutation::Delete(id) => self.delete(id).await,
        }
    }

    async fn create(&self, account: Account) -> AppResult<Account> {
        if self.repo.exists_by_username(&account.username).await? {
            return Err(AppError::conflict("Username"));
        }
        if self.repo.exists_by_email(&account.email).await? {
            return Err(AppError::conflict("Email"));
        }

        let created = self.repo.insert(account).await?;
        let event = AccountEvent::snapshot(&created, ActionType::Create);

        if let Err(err) = self.emitter.publish(&event).await {
            match self.repo.delete(created.id).await {
                Ok(()) => warn!(account_id = %created.id, "Account creation rolled back"),
                Err(undo) => error!(
                    account_id = %created.id,
                    error = %undo,
                    "Compensating delete failed; account exists without a CREATE event"
                ),
            }
            return Err(as_publish_failure(err));
        }

        info!(account_id = %created.id, username = %created.username, "Account created");
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: AccountChanges) -> AppResult<Account> {
        let current = self.repo.find_by_id(id).await?.ok_or(AppError::NotFound)?;
        changes.check_precondition(&current)?;

        let mut next = current.clone();
        changes.apply_to(&mut next);
        let saved = self.repo.update(next).await?;
        let event = AccountEvent::snapshot(&saved, ActionType::Update);

        if let Err(err) = self.emitter.publish(&event).await {
            match self.repo.update(current).await {
                Ok(_) => warn!(account_id = %id, "Account update rolled back"),
                Err(undo) => error!(
                    account_id = %id,
                    error = %undo,
                    "Restoring previous account state failed; update kept without an UPDATE event"
                ),
            }
            return Err(as_publish_failure(err));
        }

        info!(account_id = %id, "Account updated");
        Ok(saved)
    }

    async fn delete(&self, id: Uuid) -> AppResult<Account> {
        let current = self.repo.find_by_id(id).await?.ok_or(AppError::NotFound)?;
        let event = AccountEvent::snapshot(&current, ActionType::Delete);

        self.emitter.publish(&event).await.map_err(|err| {
            warn!(account_id = %id, "Delete aborted, event not published");
            as_publish_failure(err)
        })?;

        if let Err(err) = self.repo.delete(id).await {
            error!(
                account_id = %id,
                error = %err,
                "DELETE event published but removal failed"
            );
            return Err(err);
        }

        info!(account_id = %id, "Account deleted");
        Ok(current)
    }
}

fn as_publish_failure(err: AppError) -> AppError {
    match err {
        AppError::PublishFailure(_) => err,
        other => AppError::publish_failure(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MockEventEmitter;
    use crate::repository::MockAccountRepository;
    use domain::{AccountStatus, NewAccount, Role, ROLE_STUDENT};
    use mockall::Sequence;

    fn account() -> Account {
        Account::register(
            NewAccount {
                username: "joanna".to_string(),
                email: "joanna@example.com".to_string(),
                full_name: "Joanna Silva".to_string(),
                phone_number: None,
                national_id: None,
                image_url: None,
            },
            Role::new(Uuid::new_v4(), ROLE_STUDENT),
        )
    }

    fn unit_of_work(repo: MockAccountRepository, emitter: MockEventEmitter) -> AccountUnitOfWork {
        AccountUnitOfWork::new(Arc::new(repo), Arc::new(emitter), AccountLocks::new())
    }

    #[test]
    fn test_mutation_action_type() {
        let acc = account();
        assert_eq!(Mutation::Create(acc.clone()).action_type(), ActionType::Create);
        assert_eq!(
            Mutation::Update {
                id: acc.id,
                changes: AccountChanges::default()
            }
            .action_type(),
            ActionType::Update
        );
        assert_eq!(Mutation::Delete(acc.id).action_type(), ActionType::Delete);
    }

    #[tokio::test]
    async fn test_create_publishes_snapshot() {
        let acc = account();
        let mut repo = MockAccountRepository::new();
        let mut emitter = MockEventEmitter::new();

        repo.expect_exists_by_username().returning(|_| Ok(false));
        repo.expect_exists_by_email().returning(|_| Ok(false));
        repo.expect_insert().times(1).returning(|a| Ok(a));
        let expected = acc.clone();
        emitter
            .expect_publish()
            .withf(move |event| {
                event.action_type() == ActionType::Create && event.describes(&expected)
            })
            .times(1)
            .returning(|_| Ok(()));

        let created = unit_of_work(repo, emitter)
            .apply(Mutation::Create(acc.clone()))
            .await
            .unwrap();
        assert_eq!(created, acc);
    }

    #[tokio::test]
    async fn test_create_duplicate_username_emits_nothing() {
        let mut repo = MockAccountRepository::new();
        let mut emitter = MockEventEmitter::new();

        repo.expect_exists_by_username().returning(|_| Ok(true));
        repo.expect_insert().never();
        emitter.expect_publish().never();

        let result = unit_of_work(repo, emitter)
            .apply(Mutation::Create(account()))
            .await;
        assert!(matches!(result, Err(AppError::Conflict(ref what)) if what == "Username"));
    }

    #[tokio::test]
    async fn test_create_duplicate_email_emits_nothing() {
        let mut repo = MockAccountRepository::new();
        let mut emitter = MockEventEmitter::new();

        repo.expect_exists_by_username().returning(|_| Ok(false));
        repo.expect_exists_by_email().returning(|_| Ok(true));
        repo.expect_insert().never();
        emitter.expect_publish().never();

        let result = unit_of_work(repo, emitter)
            .apply(Mutation::Create(account()))
            .await;
        assert!(matches!(result, Err(AppError::Conflict(ref what)) if what == "Email"));
    }

    #[tokio::test]
    async fn test_create_publish_failure_deletes_inserted_account() {
        let acc = account();
        let id = acc.id;
        let mut repo = MockAccountRepository::new();
        let mut emitter = MockEventEmitter::new();
        let mut seq = Sequence::new();

        repo.expect_exists_by_username().returning(|_| Ok(false));
        repo.expect_exists_by_email().returning(|_| Ok(false));
        repo.expect_insert()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|a| Ok(a));
        emitter
            .expect_publish()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::publish_failure("connection refused")));
        repo.expect_delete()
            .withf(move |deleted| *deleted == id)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let result = unit_of_work(repo, emitter).apply(Mutation::Create(acc)).await;
        assert!(matches!(result, Err(AppError::PublishFailure(_))));
    }

    #[tokio::test]
    async fn test_failed_compensation_still_reports_publish_failure() {
        let mut repo = MockAccountRepository::new();
        let mut emitter = MockEventEmitter::new();

        repo.expect_exists_by_username().returning(|_| Ok(false));
        repo.expect_exists_by_email().returning(|_| Ok(false));
        repo.expect_insert().returning(|a| Ok(a));
        emitter
            .expect_publish()
            .returning(|_| Err(AppError::publish_failure("timeout")));
        repo.expect_delete()
            .times(1)
            .returning(|_| Err(AppError::internal("db gone")));

        let result = unit_of_work(repo, emitter)
            .apply(Mutation::Create(account()))
            .await;
        assert!(matches!(result, Err(AppError::PublishFailure(_))));
    }

    #[tokio::test]
    async fn test_update_publishes_post_change_state() {
        let acc = account();
        let id = acc.id;
        let mut repo = MockAccountRepository::new();
        let mut emitter = MockEventEmitter::new();

        let stored = acc.clone();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        repo.expect_update().times(1).returning(|a| Ok(a));
        emitter
            .expect_publish()
            .withf(|event| {
                event.action_type() == ActionType::Update && event.status() == "BLOCKED"
            })
            .times(1)
            .returning(|_| Ok(()));

        let changes = AccountChanges {
            status: Some(AccountStatus::Blocked),
            ..Default::default()
        };
        let updated = unit_of_work(repo, emitter)
            .apply(Mutation::Update { id, changes })
            .await
            .unwrap();

        assert!(updated.is_blocked());
        assert!(updated.updated_at >= acc.updated_at);
    }

    #[tokio::test]
    async fn test_update_publish_failure_restores_previous_state() {
        let acc = account();
        let id = acc.id;
        let mut repo = MockAccountRepository::new();
        let mut emitter = MockEventEmitter::new();
        let mut seq = Sequence::new();

        let stored = acc.clone();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        repo.expect_update()
            .withf(|a| a.full_name == "Joanna S.")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|a| Ok(a));
        emitter
            .expect_publish()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::publish_failure("bus down")));
        let original = acc.clone();
        repo.expect_update()
            .withf(move |a| *a == original)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|a| Ok(a));

        let changes = AccountChanges {
            full_name: Some("Joanna S.".to_string()),
            ..Default::default()
        };
        let result = unit_of_work(repo, emitter)
            .apply(Mutation::Update { id, changes })
            .await;
        assert!(matches!(result, Err(AppError::PublishFailure(_))));
    }

    #[tokio::test]
    async fn test_update_stale_precondition_is_rejected() {
        let acc = account();
        let id = acc.id;
        let mut repo = MockAccountRepository::new();
        let mut emitter = MockEventEmitter::new();

        let stored = acc.clone();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        repo.expect_update().never();
        emitter.expect_publish().never();

        let changes = AccountChanges {
            full_name: Some("Late".to_string()),
            expected_updated_at: Some(acc.updated_at - chrono::Duration::seconds(5)),
            ..Default::default()
        };
        let result = unit_of_work(repo, emitter)
            .apply(Mutation::Update { id, changes })
            .await;
        assert!(matches!(result, Err(AppError::ConcurrentModification)));
    }

    #[tokio::test]
    async fn test_update_missing_account() {
        let mut repo = MockAccountRepository::new();
        let mut emitter = MockEventEmitter::new();

        repo.expect_find_by_id().returning(|_| Ok(None));
        emitter.expect_publish().never();

        let result = unit_of_work(repo, emitter)
            .apply(Mutation::Update {
                id: Uuid::new_v4(),
                changes: AccountChanges::default(),
            })
            .await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_publishes_before_removing() {
        let acc = account();
        let id = acc.id;
        let mut repo = MockAccountRepository::new();
        let mut emitter = MockEventEmitter::new();
        let mut seq = Sequence::new();

        let stored = acc.clone();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        let snapshot = acc.clone();
        emitter
            .expect_publish()
            .withf(move |event| {
                event.action_type() == ActionType::Delete && event.describes(&snapshot)
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        repo.expect_delete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let removed = unit_of_work(repo, emitter)
            .apply(Mutation::Delete(id))
            .await
            .unwrap();
        assert_eq!(removed, acc);
    }

    #[tokio::test]
    async fn test_delete_publish_failure_keeps_account() {
        let acc = account();
        let id = acc.id;
        let mut repo = MockAccountRepository::new();
        let mut emitter = MockEventEmitter::new();

        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(acc.clone())));
        emitter
            .expect_publish()
            .returning(|_| Err(AppError::publish_failure("bus down")));
        repo.expect_delete().never();

        let result = unit_of_work(repo, emitter).apply(Mutation::Delete(id)).await;
        assert!(matches!(result, Err(AppError::PublishFailure(_))));
    }

    #[test]
    fn test_non_publish_errors_are_wrapped() {
        let wrapped = as_publish_failure(AppError::internal("serializer exploded"));
        assert!(matches!(wrapped, AppError::PublishFailure(ref cause) if cause.contains("Internal")));
    }
}

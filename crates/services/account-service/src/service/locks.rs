//! Per-account mutual exclusion.
//!
//! Mutations of one account run one at a time; mutations of different
//! accounts never wait on each other. Entries are dropped from the map when
//! the last holder or waiter goes away.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct AccountLocks {
    inner: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`.
    pub async fn acquire(&self, id: Uuid) -> AccountLockGuard {
        let slot = self
            .inner
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = slot.lock_owned().await;

        AccountLockGuard {
            id,
            guard: Some(guard),
            locks: Arc::clone(&self.inner),
        }
    }

    /// Number of accounts with a live lock entry
    pub fn active(&self) -> usize {
        self.inner.len()
    }
}

/// Held while an account is being mutated.
pub struct AccountLockGuard {
    id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl Drop for AccountLockGuard {
    fn drop(&mut self) {
        // Release first so the map's Arc is the only one left if nobody waits.
        self.guard.take();
        self.locks
            .remove_if(&self.id, |_, slot| Arc::strong_count(slot) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_entry_removed_after_release() {
        let locks = AccountLocks::new();
        let id = Uuid::new_v4();

        let guard = locks.acquire(id).await;
        assert_eq!(locks.active(), 1);
        drop(guard);
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_same_account_is_serialized() {
        let locks = AccountLocks::new();
        let id = Uuid::new_v4();

        let first = locks.acquire(id).await;
        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(id).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(first);
        contender.await.unwrap();
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_different_accounts_do_not_block() {
        let locks = AccountLocks::new();

        let _a = locks.acquire(Uuid::new_v4()).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire(Uuid::new_v4())).await;

        assert!(b.is_ok());
        assert_eq!(locks.active(), 2);
    }
}

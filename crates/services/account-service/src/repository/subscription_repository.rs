//! Course subscription repository backed by PostgreSQL through SeaORM.

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, SqlErr,
};
use uuid::Uuid;

use super::entities::account_course;
use common::{AppError, AppResult};
use domain::Subscription;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

pub(crate) const DUPLICATE_SUBSCRIPTION: &str = "Subscription already exists";

/// Subscription repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Check whether the account already holds a subscription to the course
    async fn exists(&self, account_id: Uuid, course_id: Uuid) -> AppResult<bool>;

    /// Store a subscription.
    ///
    /// A duplicate (account, course) pair yields `Unprocessable`; an account
    /// that no longer exists yields `NotFound`.
    async fn insert(&self, subscription: Subscription) -> AppResult<Subscription>;
}

/// Concrete implementation of SubscriptionRepository
pub struct SubscriptionStore {
    db: DatabaseConnection,
}

impl SubscriptionStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionStore {
    async fn exists(&self, account_id: Uuid, course_id: Uuid) -> AppResult<bool> {
        let count = account_course::Entity::find()
            .filter(account_course::Column::AccountId.eq(account_id))
            .filter(account_course::Column::CourseId.eq(course_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn insert(&self, subscription: Subscription) -> AppResult<Subscription> {
        account_course::Entity::insert(account_course::ActiveModel::from(&subscription))
            .exec_without_returning(&self.db)
            .await
            .map_err(map_insert_err)?;

        Ok(subscription)
    }
}

fn map_insert_err(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::unprocessable(DUPLICATE_SUBSCRIPTION)
        }
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => AppError::NotFound,
        _ => AppError::from(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn test_exists_filters_on_account_and_course() {
        let account_id = Uuid::new_v4();
        let course_id = Uuid::new_v4();
        let sql = account_course::Entity::find()
            .filter(account_course::Column::AccountId.eq(account_id))
            .filter(account_course::Column::CourseId.eq(course_id))
            .build(DbBackend::Postgres)
            .to_string();

        assert!(sql.contains(&format!(r#""account_courses"."account_id" = '{}'"#, account_id)));
        assert!(sql.contains(&format!(r#""account_courses"."course_id" = '{}'"#, course_id)));
    }

    #[test]
    fn test_unrelated_db_errors_pass_through() {
        let err = map_insert_err(DbErr::Custom("boom".to_string()));
        assert!(matches!(err, AppError::Database(_)));
    }
}

//! Account repository backed by PostgreSQL through SeaORM.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func, LikeExpr, Query};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    ItemsAndPagesNumber, Order, PaginatorTrait, QueryFilter, QueryOrder, Select, Set, SqlErr,
    TransactionTrait,
};
use uuid::Uuid;

use super::entities::{account, account_role, role};
use crate::query::{AccountOrder, Predicate, SortKey};
use common::{AppError, AppResult};
use domain::{Account, Page, PageRequest, Role, SortDirection};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Account repository trait for dependency injection.
///
/// Writes replace the account row and its role set together.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Find account by ID, roles included
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>>;

    async fn exists_by_username(&self, username: &str) -> AppResult<bool>;

    async fn exists_by_email(&self, email: &str) -> AppResult<bool>;

    /// Look up a seeded role by name
    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>>;

    /// Insert a new account. Duplicate username or email yields `Conflict`.
    async fn insert(&self, account: Account) -> AppResult<Account>;

    /// Overwrite every stored field of an existing account
    async fn update(&self, account: Account) -> AppResult<Account>;

    /// Remove an account and its role links
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// One page of accounts matching `predicate`
    async fn scan(&self, predicate: &Predicate, page: &PageRequest) -> AppResult<Page<Account>>;
}

/// Concrete implementation of AccountRepository
pub struct AccountStore {
    db: DatabaseConnection,
}

impl AccountStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Load roles for every given account in one query.
    async fn roles_for(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, Vec<Role>>> {
        let mut roles: HashMap<Uuid, Vec<Role>> = HashMap::new();
        if ids.is_empty() {
            return Ok(roles);
        }

        let links = account_role::Entity::find()
            .filter(account_role::Column::AccountId.is_in(ids.to_vec()))
            .find_also_related(role::Entity)
            .all(&self.db)
            .await?;

        for (link, role) in links {
            if let Some(role) = role {
                roles.entry(link.account_id).or_default().push(Role::from(role));
            }
        }
        Ok(roles)
    }

    async fn hydrate(&self, models: Vec<account::Model>) -> AppResult<Vec<Account>> {
        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let mut roles = self.roles_for(&ids).await?;

        models
            .into_iter()
            .map(|model| {
                let held = roles.remove(&model.id).unwrap_or_default();
                model.into_account(held)
            })
            .collect()
    }

    async fn write_roles(txn: &DatabaseTransaction, account: &Account) -> Result<(), DbErr> {
        account_role::Entity::delete_many()
            .filter(account_role::Column::AccountId.eq(account.id))
            .exec(txn)
            .await?;

        if account.roles.is_empty() {
            return Ok(());
        }

        let links = account.roles.iter().map(|role| account_role::ActiveModel {
            account_id: Set(account.id),
            role_id: Set(role.id),
        });
        account_role::Entity::insert_many(links)
            .exec_without_returning(txn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for AccountStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        let Some(model) = account::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut accounts = self.hydrate(vec![model]).await?;
        Ok(accounts.pop())
    }

    async fn exists_by_username(&self, username: &str) -> AppResult<bool> {
        let count = account::Entity::find()
            .filter(account::Column::Username.eq(username))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
        let count = account::Entity::find()
            .filter(account::Column::Email.eq(email))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        let result = role::Entity::find()
            .filter(role::Column::Name.eq(name))
            .one(&self.db)
            .await?;

        Ok(result.map(Role::from))
    }

    async fn insert(&self, account: Account) -> AppResult<Account> {
        let txn = self.db.begin().await?;

        account::Entity::insert(account::ActiveModel::from(&account))
            .exec_without_returning(&txn)
            .await
            .map_err(map_write_err)?;
        Self::write_roles(&txn, &account).await?;

        txn.commit().await?;
        Ok(account)
    }

    async fn update(&self, account: Account) -> AppResult<Account> {
        let txn = self.db.begin().await?;

        account::Entity::update(account::ActiveModel::from(&account))
            .exec(&txn)
            .await
            .map_err(|err| match err {
                DbErr::RecordNotUpdated => AppError::NotFound,
                other => map_write_err(other),
            })?;
        Self::write_roles(&txn, &account).await?;

        txn.commit().await?;
        Ok(account)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = account::Entity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }

    async fn scan(&self, predicate: &Predicate, page: &PageRequest) -> AppResult<Page<Account>> {
        let order = AccountOrder::resolve(page.sort.as_ref())?;
        let select = ordered(
            account::Entity::find().filter(condition_for(predicate)),
            order,
        );

        let paginator = select.paginate(&self.db, page.size);
        let ItemsAndPagesNumber {
            number_of_items, ..
        } = paginator.num_items_and_pages().await?;

        if page.offset() >= number_of_items {
            return Ok(Page::new(Vec::new(), page, number_of_items));
        }

        let models = paginator.fetch_page(page.page).await?;
        let accounts = self.hydrate(models).await?;
        Ok(Page::new(accounts, page, number_of_items))
    }
}

/// Translate a predicate into a SeaORM condition.
///
/// Mirrors [`Predicate::matches`] so that SQL and in-memory evaluation
/// select the same rows.
pub(crate) fn condition_for(predicate: &Predicate) -> Condition {
    match predicate {
        Predicate::Always => Condition::all(),
        Predicate::TypeIs(account_type) => {
            Condition::all().add(account::Column::AccountType.eq(account_type.as_str()))
        }
        Predicate::StatusIs(status) => {
            Condition::all().add(account::Column::Status.eq(status.as_str()))
        }
        Predicate::HasRole(name) => {
            let holders = Query::select()
                .column((account_role::Entity, account_role::Column::AccountId))
                .from(account_role::Entity)
                .inner_join(
                    role::Entity,
                    Expr::col((role::Entity, role::Column::Id))
                        .equals((account_role::Entity, account_role::Column::RoleId)),
                )
                .and_where(Expr::col((role::Entity, role::Column::Name)).eq(name.as_str()))
                .to_owned();
            Condition::all().add(account::Column::Id.in_subquery(holders))
        }
        Predicate::CreatedWithin { from, to } => {
            let mut condition = Condition::all();
            if let Some(from) = from {
                condition = condition.add(account::Column::CreatedAt.gte(*from));
            }
            if let Some(to) = to {
                condition = condition.add(account::Column::CreatedAt.lte(*to));
            }
            condition
        }
        Predicate::TextContains(fragment) => {
            let pattern = format!("%{}%", escape_like(&fragment.to_lowercase()));
            Condition::any()
                .add(lower_like(account::Column::Username, &pattern))
                .add(lower_like(account::Column::Email, &pattern))
        }
        Predicate::All(parts) => parts
            .iter()
            .fold(Condition::all(), |condition, part| {
                condition.add(condition_for(part))
            }),
    }
}

fn lower_like(column: account::Column, pattern: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col((account::Entity, column))))
        .like(LikeExpr::new(pattern).escape('\\'))
}

fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn ordered(select: Select<account::Entity>, order: AccountOrder) -> Select<account::Entity> {
    let column = match order.key {
        SortKey::Id => account::Column::Id,
        SortKey::Username => account::Column::Username,
        SortKey::Email => account::Column::Email,
        SortKey::FullName => account::Column::FullName,
        SortKey::CreatedAt => account::Column::CreatedAt,
        SortKey::UpdatedAt => account::Column::UpdatedAt,
    };
    let direction = match order.direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    };

    let select = select.order_by(column, direction);
    if order.key == SortKey::Id {
        select
    } else {
        select.order_by_asc(account::Column::Id)
    }
}

/// Map unique-constraint violations to `Conflict` naming the clashing field.
fn map_write_err(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            if detail.contains("email") {
                AppError::conflict("Email")
            } else if detail.contains("username") {
                AppError::conflict("Username")
            } else {
                AppError::conflict("Account")
            }
        }
        _ => AppError::from(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{AccountStatus, AccountType, FilterSpec, ROLE_ADMIN};
    use sea_orm::{DbBackend, QuerySelect, QueryTrait};

    fn sql_for(predicate: &Predicate) -> String {
        account::Entity::find()
            .select_only()
            .column(account::Column::Id)
            .filter(condition_for(predicate))
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn test_always_has_no_where_clause() {
        assert!(!sql_for(&Predicate::Always).contains("WHERE"));
    }

    #[test]
    fn test_type_and_role_render_as_conjunction() {
        let predicate = crate::query::build(
            &FilterSpec::default()
                .with_type(AccountType::Student)
                .with_role(ROLE_ADMIN),
        );
        let sql = sql_for(&predicate);

        assert!(sql.contains(r#""accounts"."account_type" = 'STUDENT'"#));
        assert!(sql.contains(r#""roles"."name" = 'ADMIN'"#));
        assert!(sql.contains(" IN (SELECT "));
        assert!(sql.contains(" AND "));
    }

    #[test]
    fn test_text_searches_username_or_email() {
        let sql = sql_for(&Predicate::TextContains("jo".to_string()));

        assert!(sql.contains(r#"LOWER("accounts"."username") LIKE '%jo%'"#));
        assert!(sql.contains(r#"LOWER("accounts"."email") LIKE '%jo%'"#));
        assert!(sql.contains(" OR "));
    }

    #[test]
    fn test_status_filter() {
        let sql = sql_for(&Predicate::StatusIs(AccountStatus::Blocked));
        assert!(sql.contains(r#""accounts"."status" = 'BLOCKED'"#));
    }

    #[test]
    fn test_escape_like_wildcards() {
        assert_eq!(escape_like("50%_off"), r"50\%\_off");
        assert_eq!(escape_like("plain"), "plain");
    }
}

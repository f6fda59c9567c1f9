//! Account database entity for SeaORM.

use std::collections::BTreeSet;

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use common::{AppError, AppResult};
use domain::{Account, Role};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub national_id: Option<String>,
    pub image_url: Option<String>,
    pub status: String,
    pub account_type: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::account_role::Entity")]
    AccountRole,
}

impl Related<super::account_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountRole.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Convert the row plus its loaded roles into the domain entity
    pub fn into_account(self, roles: impl IntoIterator<Item = Role>) -> AppResult<Account> {
        Ok(Account {
            id: self.id,
            username: self.username,
            email: self.email,
            full_name: self.full_name,
            phone_number: self.phone_number,
            national_id: self.national_id,
            image_url: self.image_url,
            status: self.status.parse().map_err(AppError::from)?,
            account_type: self.account_type.parse().map_err(AppError::from)?,
            roles: roles.into_iter().collect::<BTreeSet<_>>(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        ActiveModel {
            id: Set(account.id),
            username: Set(account.username.clone()),
            email: Set(account.email.clone()),
            full_name: Set(account.full_name.clone()),
            phone_number: Set(account.phone_number.clone()),
            national_id: Set(account.national_id.clone()),
            image_url: Set(account.image_url.clone()),
            status: Set(account.status.to_string()),
            account_type: Set(account.account_type.to_string()),
            created_at: Set(account.created_at),
            updated_at: Set(account.updated_at),
        }
    }
}

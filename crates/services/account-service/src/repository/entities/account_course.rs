//! Course subscriptions held by accounts.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use domain::Subscription;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "account_courses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub course_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id",
        on_delete = "Cascade"
    )]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Subscription {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            course_id: model.course_id,
        }
    }
}

impl From<&Subscription> for ActiveModel {
    fn from(subscription: &Subscription) -> Self {
        Self {
            id: Set(subscription.id),
            account_id: Set(subscription.account_id),
            course_id: Set(subscription.course_id),
        }
    }
}

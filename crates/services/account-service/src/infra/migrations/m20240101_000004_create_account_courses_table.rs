//! Migration: Create the account course subscription table.

use sea_orm_migration::prelude::*;

use super::m20240101_000002_create_accounts_table::Accounts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AccountCourses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountCourses::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccountCourses::AccountId).uuid().not_null())
                    .col(ColumnDef::new(AccountCourses::CourseId).uuid().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_courses_account")
                            .from(AccountCourses::Table, AccountCourses::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One subscription per account and course
        manager
            .create_index(
                Index::create()
                    .name("uq_account_courses_account_course")
                    .table(AccountCourses::Table)
                    .col(AccountCourses::AccountId)
                    .col(AccountCourses::CourseId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AccountCourses::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AccountCourses {
    Table,
    Id,
    AccountId,
    CourseId,
}

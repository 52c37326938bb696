//! Create `contacts` table owned by `users`.
//!
//! Per-owner uniqueness of email and phone lives in the index migration.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Contacts::Table)
                    .if_not_exists()
                    .col(uuid(Contacts::Id).primary_key())
                    .col(uuid(Contacts::UserId).not_null())
                    .col(string_len(Contacts::FirstName, 50).not_null())
                    .col(string_len(Contacts::LastName, 50).not_null())
                    .col(string_len(Contacts::Email, 50).not_null())
                    .col(string_len(Contacts::PhoneNumber, 20).not_null())
                    .col(date(Contacts::Birthday).not_null())
                    .col(ColumnDef::new(Contacts::OtherInfo).string_len(250).null())
                    .col(timestamp_with_time_zone(Contacts::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Contacts::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contacts_user")
                            .from(Contacts::Table, Contacts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Contacts::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Contacts {
    Table,
    Id,
    UserId,
    FirstName,
    LastName,
    Email,
    PhoneNumber,
    Birthday,
    OtherInfo,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users { Table, Id }

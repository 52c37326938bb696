use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Contacts: one email and one phone number per owner
        manager
            .create_index(
                Index::create()
                    .name("uniq_contacts_user_email")
                    .table(Contacts::Table)
                    .col(Contacts::UserId)
                    .col(Contacts::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("uniq_contacts_user_phone")
                    .table(Contacts::Table)
                    .col(Contacts::UserId)
                    .col(Contacts::PhoneNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Tokens: lookups by owner for revocation
        manager
            .create_index(
                Index::create()
                    .name("idx_tokens_user")
                    .table(Tokens::Table)
                    .col(Tokens::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("uniq_contacts_user_email").table(Contacts::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_contacts_user_phone").table(Contacts::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_tokens_user").table(Tokens::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Contacts { Table, UserId, Email, PhoneNumber }

#[derive(DeriveIden)]
enum Tokens { Table, UserId }

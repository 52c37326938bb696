//! Create `tokens` table holding opaque refresh tokens.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tokens::Table)
                    .if_not_exists()
                    .col(uuid(Tokens::Id).primary_key())
                    .col(uuid(Tokens::UserId).not_null())
                    .col(string_len(Tokens::Token, 64).unique_key().not_null())
                    .col(string_len(Tokens::TokenType, 32).not_null())
                    .col(timestamp_with_time_zone(Tokens::ExpiresAt).not_null())
                    .col(timestamp_with_time_zone(Tokens::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tokens_user")
                            .from(Tokens::Table, Tokens::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Tokens::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Tokens { Table, Id, UserId, Token, TokenType, ExpiresAt, CreatedAt }

#[derive(DeriveIden)]
enum Users { Table, Id }

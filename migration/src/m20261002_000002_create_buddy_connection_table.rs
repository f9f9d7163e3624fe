use sea_orm_migration::prelude::*;

/// Creates the `buddy_connection` table for accountability pairs.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum BuddyConnection {
    Table,
    Id,
    RequesterId,
    ReceiverId,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BuddyConnection::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BuddyConnection::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BuddyConnection::RequesterId).uuid().not_null())
                    .col(ColumnDef::new(BuddyConnection::ReceiverId).uuid().not_null())
                    .col(
                        ColumnDef::new(BuddyConnection::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(BuddyConnection::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_buddy_connection_requester_id")
                            .from(BuddyConnection::Table, BuddyConnection::RequesterId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_buddy_connection_receiver_id")
                            .from(BuddyConnection::Table, BuddyConnection::ReceiverId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_buddy_connection_pair")
                    .table(BuddyConnection::Table)
                    .col(BuddyConnection::RequesterId)
                    .col(BuddyConnection::ReceiverId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BuddyConnection::Table).to_owned())
            .await
    }
}

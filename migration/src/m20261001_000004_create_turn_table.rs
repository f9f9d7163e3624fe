use sea_orm_migration::prelude::*;

/// Creates the `turn` table: one numbered round per room.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Turn {
    Table,
    Id,
    RoomId,
    TurnNumber,
    EventJson,
    Status,
    ResolvedAt,
}

#[derive(DeriveIden)]
enum Room {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Turn::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Turn::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Turn::RoomId).uuid().not_null())
                    .col(ColumnDef::new(Turn::TurnNumber).integer().not_null())
                    .col(ColumnDef::new(Turn::EventJson).json_binary().null())
                    .col(
                        ColumnDef::new(Turn::Status)
                            .string_len(20)
                            .not_null()
                            .default("planning"),
                    )
                    .col(
                        ColumnDef::new(Turn::ResolvedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_turn_room_id")
                            .from(Turn::Table, Turn::RoomId)
                            .to(Room::Table, Room::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_turn_room_number")
                    .table(Turn::Table)
                    .col(Turn::RoomId)
                    .col(Turn::TurnNumber)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Turn::Table).to_owned())
            .await
    }
}

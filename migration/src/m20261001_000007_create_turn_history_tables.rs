use sea_orm_migration::prelude::*;

/// Creates the append-only `action_log` and `turn_result` history tables.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum ActionLog {
    Table,
    Id,
    RoomId,
    TurnNumber,
    Role,
    ActionJson,
    CreatedAt,
}

#[derive(DeriveIden)]
enum TurnResult {
    Table,
    Id,
    RoomId,
    TurnNumber,
    ResultJson,
    CreatedAt,
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
                    .table(ActionLog::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ActionLog::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ActionLog::RoomId).uuid().not_null())
                    .col(ColumnDef::new(ActionLog::TurnNumber).integer().not_null())
                    .col(ColumnDef::new(ActionLog::Role).string_len(20).not_null())
                    .col(ColumnDef::new(ActionLog::ActionJson).json_binary().not_null())
                    .col(
                        ColumnDef::new(ActionLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_action_log_room_id")
                            .from(ActionLog::Table, ActionLog::RoomId)
                            .to(Room::Table, Room::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_action_log_room_turn")
                    .table(ActionLog::Table)
                    .col(ActionLog::RoomId)
                    .col(ActionLog::TurnNumber)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TurnResult::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TurnResult::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(TurnResult::RoomId).uuid().not_null())
                    .col(ColumnDef::new(TurnResult::TurnNumber).integer().not_null())
                    .col(ColumnDef::new(TurnResult::ResultJson).json_binary().not_null())
                    .col(
                        ColumnDef::new(TurnResult::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_turn_result_room_id")
                            .from(TurnResult::Table, TurnResult::RoomId)
                            .to(Room::Table, Room::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_turn_result_room_turn")
                    .table(TurnResult::Table)
                    .col(TurnResult::RoomId)
                    .col(TurnResult::TurnNumber)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TurnResult::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ActionLog::Table).to_owned())
            .await
    }
}

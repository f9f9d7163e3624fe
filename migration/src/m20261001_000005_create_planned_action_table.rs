use sea_orm_migration::prelude::*;

/// Creates the `planned_action` table: one submission per role per turn.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum PlannedAction {
    Table,
    Id,
    RoomId,
    TurnNumber,
    UserId,
    Role,
    ActionsJson,
    EventChoiceId,
    SubmittedAt,
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
                    .table(PlannedAction::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PlannedAction::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PlannedAction::RoomId).uuid().not_null())
                    .col(
                        ColumnDef::new(PlannedAction::TurnNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PlannedAction::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(PlannedAction::Role)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlannedAction::ActionsJson)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlannedAction::EventChoiceId)
                            .string_len(50)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PlannedAction::SubmittedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_planned_action_room_id")
                            .from(PlannedAction::Table, PlannedAction::RoomId)
                            .to(Room::Table, Room::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_planned_action_room_turn_role")
                    .table(PlannedAction::Table)
                    .col(PlannedAction::RoomId)
                    .col(PlannedAction::TurnNumber)
                    .col(PlannedAction::Role)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PlannedAction::Table).to_owned())
            .await
    }
}

use sea_orm_migration::prelude::*;

/// Creates the `game_state` table: one versioned snapshot per room.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum GameState {
    Table,
    RoomId,
    StateJson,
    Version,
    UpdatedAt,
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
                    .table(GameState::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GameState::RoomId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GameState::StateJson).json_binary().not_null())
                    .col(
                        ColumnDef::new(GameState::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(GameState::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_state_room_id")
                            .from(GameState::Table, GameState::RoomId)
                            .to(Room::Table, Room::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GameState::Table).to_owned())
            .await
    }
}

use sea_orm_migration::prelude::*;

/// Creates the `habit` and `habit_log` tables for the habit tracker.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Habit {
    Table,
    Id,
    UserId,
    Name,
    Emoji,
    TargetPerWeek,
    IsActive,
    SortOrder,
    CreatedAt,
}

#[derive(DeriveIden)]
enum HabitLog {
    Table,
    Id,
    UserId,
    HabitId,
    DateIso,
    Done,
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
                    .table(Habit::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Habit::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Habit::UserId).uuid().not_null())
                    .col(ColumnDef::new(Habit::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Habit::Emoji).string_len(50).null())
                    .col(
                        ColumnDef::new(Habit::TargetPerWeek)
                            .integer()
                            .not_null()
                            .default(7),
                    )
                    .col(
                        ColumnDef::new(Habit::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Habit::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Habit::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_habit_user_id")
                            .from(Habit::Table, Habit::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HabitLog::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(HabitLog::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(HabitLog::UserId).uuid().not_null())
                    .col(ColumnDef::new(HabitLog::HabitId).uuid().not_null())
                    .col(ColumnDef::new(HabitLog::DateIso).string_len(10).not_null())
                    .col(
                        ColumnDef::new(HabitLog::Done)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(HabitLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_habit_log_user_id")
                            .from(HabitLog::Table, HabitLog::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_habit_log_habit_id")
                            .from(HabitLog::Table, HabitLog::HabitId)
                            .to(Habit::Table, Habit::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_habit_log_user_habit_date")
                    .table(HabitLog::Table)
                    .col(HabitLog::UserId)
                    .col(HabitLog::HabitId)
                    .col(HabitLog::DateIso)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HabitLog::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Habit::Table).to_owned())
            .await
    }
}

pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_user_table;
mod m20261001_000002_create_room_table;
mod m20261001_000003_create_player_table;
mod m20261001_000004_create_turn_table;
mod m20261001_000005_create_planned_action_table;
mod m20261001_000006_create_game_state_table;
mod m20261001_000007_create_turn_history_tables;
mod m20261002_000001_create_habit_tables;
mod m20261002_000002_create_buddy_connection_table;
mod m20261002_000003_create_notification_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_user_table::Migration),
            Box::new(m20261001_000002_create_room_table::Migration),
            Box::new(m20261001_000003_create_player_table::Migration),
            Box::new(m20261001_000004_create_turn_table::Migration),
            Box::new(m20261001_000005_create_planned_action_table::Migration),
            Box::new(m20261001_000006_create_game_state_table::Migration),
            Box::new(m20261001_000007_create_turn_history_tables::Migration),
            Box::new(m20261002_000001_create_habit_tables::Migration),
            Box::new(m20261002_000002_create_buddy_connection_table::Migration),
            Box::new(m20261002_000003_create_notification_table::Migration),
        ]
    }
}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::room_status::{RoomPhase, RoomStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "room")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub scenario_id: String,
    pub seed: i32,
    pub status: String,
    pub current_turn: i32,
    pub phase: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Parsed lifecycle status. Unknown values read as `Waiting`.
    #[must_use]
    pub fn room_status(&self) -> RoomStatus {
        RoomStatus::from_str(&self.status).unwrap_or_default()
    }

    /// Parsed turn phase. Unknown values read as `Waiting`.
    #[must_use]
    pub fn room_phase(&self) -> RoomPhase {
        RoomPhase::from_str(&self.phase).unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::player::Entity")]
    Player,
    #[sea_orm(has_many = "super::turn::Entity")]
    Turn,
    #[sea_orm(has_one = "super::game_state::Entity")]
    GameState,
}

impl Related<super::player::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Player.def()
    }
}

impl Related<super::turn::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Turn.def()
    }
}

impl Related<super::game_state::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GameState.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

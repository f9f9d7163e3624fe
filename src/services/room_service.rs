use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use rand::Rng;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::entities::{
    RoomPhase, RoomStatus, action_log, game_state, planned_action, player, room, turn,
    turn_result, user,
};
use crate::error::AppError;
use crate::game::{self, ActionType, Role, Scenario};
use crate::services::conflict_on_unique;
use crate::services::turn_service::parse_state;
use crate::state::AppState;
use crate::utils::{generate_room_code, is_valid_room_code, normalize_room_code};

const MAX_CODE_ATTEMPTS: usize = 20;
const MAX_SEED: i32 = 1_000_000;
const SEATS: u64 = 2;

// ─────────────────────────────────────────────────────────────────────────────
// Views
// ─────────────────────────────────────────────────────────────────────────────

/// A room and the caller's seat in it.
#[derive(Debug, Clone)]
pub struct Membership {
    pub room: room::Model,
    pub player: player::Model,
}

impl Membership {
    #[must_use]
    pub fn role(&self) -> Role {
        Role::from_str(&self.player.role).unwrap_or(Role::Prospect)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    #[serde(flatten)]
    pub room: room::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub player_count: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomLists {
    pub my_rooms: Vec<RoomSummary>,
    pub available_rooms: Vec<RoomSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatedPlayer {
    #[serde(flatten)]
    pub player: player::Model,
    pub username: String,
    pub display_name: Option<String>,
    pub online: bool,
}

/// Everything a client needs to render a room.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetail {
    pub room: room::Model,
    pub me: player::Model,
    pub players: Vec<SeatedPlayer>,
    pub game_state: Option<game_state::Model>,
    pub current_turn: Option<turn::Model>,
    pub my_planned_action: Option<planned_action::Model>,
    pub opponent_submitted: bool,
    pub available_actions: Vec<ActionType>,
    /// Node-targeted deployments open to the architect, keyed by node id.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub node_actions: BTreeMap<String, Vec<ActionType>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnDetail {
    pub turn: turn::Model,
    pub result: Option<turn_result::Model>,
    pub action_logs: Vec<action_log::Model>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Service
// ─────────────────────────────────────────────────────────────────────────────

pub struct RoomService;

impl RoomService {
    /// Open a room for `scenario_id` and seat the creator as ARCHITECT.
    pub async fn create_room(
        state: &AppState,
        creator: &user::Model,
        scenario_id: &str,
    ) -> Result<Membership, AppError> {
        let scenario = Scenario::parse(scenario_id).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Unknown scenario '{scenario_id}'. Expected one of: {}.",
                Scenario::ALL.map(|s| s.as_str()).join(", ")
            ))
        })?;

        let code = Self::unique_code(&state.db).await?;
        let seed = rand::thread_rng().gen_range(0..MAX_SEED);
        let now = Utc::now().fixed_offset();

        let txn = state.db.begin().await?;

        let created = room::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code),
            scenario_id: Set(scenario.as_str().to_string()),
            seed: Set(seed),
            status: Set(RoomStatus::Waiting.as_str().to_string()),
            current_turn: Set(1),
            phase: Set(RoomPhase::Waiting.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| conflict_on_unique(e, "Room code collision, please retry."))?;

        let seat = player::ActiveModel {
            id: Set(Uuid::new_v4()),
            room_id: Set(created.id),
            user_id: Set(creator.id),
            role: Set(Role::Architect.as_str().to_string()),
            joined_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        tracing::info!(room_id = %created.id, code = %created.code, scenario = %created.scenario_id, "room created");

        Ok(Membership {
            room: created,
            player: seat,
        })
    }

    /// Join by code. Returns the membership and whether a new seat was taken.
    pub async fn join_room(
        state: &AppState,
        joiner: &user::Model,
        code: &str,
    ) -> Result<(Membership, bool), AppError> {
        if !is_valid_room_code(code.trim()) {
            return Err(AppError::BadRequest(
                "Room code must be 8 characters.".to_string(),
            ));
        }
        let code = normalize_room_code(code);

        let found = room::Entity::find()
            .filter(room::Column::Code.eq(&code))
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Room not found.".to_string()))?;

        let seats = player::Entity::find()
            .filter(player::Column::RoomId.eq(found.id))
            .all(&state.db)
            .await?;

        if let Some(existing) = seats.iter().find(|p| p.user_id == joiner.id) {
            return Ok((
                Membership {
                    room: found,
                    player: existing.clone(),
                },
                false,
            ));
        }

        if seats.len() as u64 >= SEATS {
            return Err(AppError::BadRequest("Room is full.".to_string()));
        }
        if !found.room_status().can_join() {
            return Err(AppError::BadRequest(
                "This room is no longer accepting players.".to_string(),
            ));
        }

        let architect_taken = seats.iter().any(|p| p.role == Role::Architect.as_str());
        let role = if architect_taken {
            Role::Prospect
        } else {
            Role::Architect
        };

        let txn = state.db.begin().await?;

        let seat = player::ActiveModel {
            id: Set(Uuid::new_v4()),
            room_id: Set(found.id),
            user_id: Set(joiner.id),
            role: Set(role.as_str().to_string()),
            joined_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&txn)
        .await
        .map_err(|e| conflict_on_unique(e, "That seat was just taken."))?;

        let seated = seats.len() as u64 + 1;
        if seated == SEATS {
            let result = room::Entity::update_many()
                .col_expr(room::Column::Status, Expr::value(RoomStatus::Active.as_str()))
                .col_expr(room::Column::Phase, Expr::value(RoomPhase::Event.as_str()))
                .col_expr(room::Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
                .filter(room::Column::Id.eq(found.id))
                .filter(room::Column::Phase.eq(RoomPhase::Waiting.as_str()))
                .exec(&txn)
                .await?;
            if result.rows_affected == 0 {
                return Err(AppError::Conflict(
                    "Room changed while joining, please retry.".to_string(),
                ));
            }
        }

        txn.commit().await?;

        let room_now = Self::find_room(state, found.id).await?;

        tracing::info!(room_id = %room_now.id, user_id = %joiner.id, role = %role, "player joined room");
        state.room_hub.emit(
            room_now.id,
            "player-joined",
            json!({
                "player": {
                    "id": seat.id,
                    "userId": joiner.id,
                    "username": joiner.username,
                    "role": role,
                },
                "status": room_now.status,
                "phase": room_now.phase,
                "playerCount": seated,
            }),
        );

        Ok((
            Membership {
                room: room_now,
                player: seat,
            },
            true,
        ))
    }

    /// The caller's rooms plus waiting rooms with a free seat.
    pub async fn list_rooms(state: &AppState, user_id: Uuid) -> Result<RoomLists, AppError> {
        let my_seats = player::Entity::find()
            .filter(player::Column::UserId.eq(user_id))
            .all(&state.db)
            .await?;
        let my_role: HashMap<Uuid, String> = my_seats
            .into_iter()
            .map(|p| (p.room_id, p.role))
            .collect();

        let mine = room::Entity::find()
            .filter(room::Column::Id.is_in(my_role.keys().copied().collect::<Vec<_>>()))
            .order_by_desc(room::Column::UpdatedAt)
            .all(&state.db)
            .await?;

        let waiting = room::Entity::find()
            .filter(room::Column::Status.eq(RoomStatus::Waiting.as_str()))
            .order_by_desc(room::Column::CreatedAt)
            .all(&state.db)
            .await?;

        let mut counts: HashMap<Uuid, u64> = HashMap::new();
        let room_ids: Vec<Uuid> = mine.iter().chain(waiting.iter()).map(|r| r.id).collect();
        for seat in player::Entity::find()
            .filter(player::Column::RoomId.is_in(room_ids))
            .all(&state.db)
            .await?
        {
            *counts.entry(seat.room_id).or_default() += 1;
        }

        let my_rooms = mine
            .into_iter()
            .map(|r| RoomSummary {
                role: my_role.get(&r.id).cloned(),
                player_count: counts.get(&r.id).copied().unwrap_or_default(),
                room: r,
            })
            .collect();

        let available_rooms = waiting
            .into_iter()
            .filter(|r| !my_role.contains_key(&r.id))
            .map(|r| RoomSummary {
                role: None,
                player_count: counts.get(&r.id).copied().unwrap_or_default(),
                room: r,
            })
            .filter(|s| s.player_count < SEATS)
            .collect();

        Ok(RoomLists {
            my_rooms,
            available_rooms,
        })
    }

    /// Load a room and the caller's seat: 404 for an unknown room, 403 for a non-member.
    pub async fn load_member(
        state: &AppState,
        room_id: Uuid,
        user_id: Uuid,
    ) -> Result<Membership, AppError> {
        let found = Self::find_room(state, room_id).await?;
        let seat = player::Entity::find()
            .filter(player::Column::RoomId.eq(room_id))
            .filter(player::Column::UserId.eq(user_id))
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::Forbidden("You are not a member of this room.".to_string()))?;
        Ok(Membership {
            room: found,
            player: seat,
        })
    }

    pub async fn room_detail(
        state: &AppState,
        room_id: Uuid,
        user_id: Uuid,
    ) -> Result<RoomDetail, AppError> {
        let membership = Self::load_member(state, room_id, user_id).await?;
        let role = membership.role();
        let Membership { room: found, player: me } = membership;

        let seats = player::Entity::find()
            .filter(player::Column::RoomId.eq(room_id))
            .order_by_asc(player::Column::JoinedAt)
            .all(&state.db)
            .await?;
        let users = user::Entity::find()
            .filter(user::Column::Id.is_in(seats.iter().map(|p| p.user_id).collect::<Vec<_>>()))
            .all(&state.db)
            .await?;
        let players = seats
            .into_iter()
            .filter_map(|p| {
                let u = users.iter().find(|u| u.id == p.user_id)?;
                Some(SeatedPlayer {
                    online: state.room_hub.is_connected(room_id, p.user_id),
                    username: u.username.clone(),
                    display_name: u.display_name.clone(),
                    player: p,
                })
            })
            .collect();

        let stored_state = game_state::Entity::find_by_id(room_id).one(&state.db).await?;
        let current_turn = turn::Entity::find()
            .filter(turn::Column::RoomId.eq(room_id))
            .filter(turn::Column::TurnNumber.eq(found.current_turn))
            .one(&state.db)
            .await?;

        let planned = planned_action::Entity::find()
            .filter(planned_action::Column::RoomId.eq(room_id))
            .filter(planned_action::Column::TurnNumber.eq(found.current_turn))
            .all(&state.db)
            .await?;
        let opponent_submitted = planned.iter().any(|p| p.role == role.opponent().as_str());
        let my_planned_action = planned.into_iter().find(|p| p.role == role.as_str());

        let mut available_actions = Vec::new();
        let mut node_actions = BTreeMap::new();
        if let Some(model) = &stored_state {
            let parsed = parse_state(model)?;
            available_actions = game::available_actions(&parsed, role, None);
            if role == Role::Architect {
                for node in &parsed.nodes {
                    let targeted: Vec<ActionType> =
                        game::available_actions(&parsed, role, Some(&node.id))
                            .into_iter()
                            .filter(|a| a.capability().is_some())
                            .collect();
                    if !targeted.is_empty() {
                        node_actions.insert(node.id.clone(), targeted);
                    }
                }
            }
        }

        Ok(RoomDetail {
            room: found,
            me,
            players,
            game_state: stored_state,
            current_turn,
            my_planned_action,
            opponent_submitted,
            available_actions,
            node_actions,
        })
    }

    /// A turn with its stored result and action log, for members only.
    pub async fn get_turn(
        state: &AppState,
        room_id: Uuid,
        user_id: Uuid,
        turn_number: i32,
    ) -> Result<TurnDetail, AppError> {
        Self::load_member(state, room_id, user_id).await?;

        let found = turn::Entity::find()
            .filter(turn::Column::RoomId.eq(room_id))
            .filter(turn::Column::TurnNumber.eq(turn_number))
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Turn {turn_number} not found.")))?;

        let result = turn_result::Entity::find()
            .filter(turn_result::Column::RoomId.eq(room_id))
            .filter(turn_result::Column::TurnNumber.eq(turn_number))
            .one(&state.db)
            .await?;

        let action_logs = action_log::Entity::find()
            .filter(action_log::Column::RoomId.eq(room_id))
            .filter(action_log::Column::TurnNumber.eq(turn_number))
            .order_by_asc(action_log::Column::CreatedAt)
            .all(&state.db)
            .await?;

        Ok(TurnDetail {
            turn: found,
            result,
            action_logs,
        })
    }

    pub async fn player_count(state: &AppState, room_id: Uuid) -> Result<u64, AppError> {
        Ok(player::Entity::find()
            .filter(player::Column::RoomId.eq(room_id))
            .count(&state.db)
            .await?)
    }

    pub(crate) async fn find_room(state: &AppState, room_id: Uuid) -> Result<room::Model, AppError> {
        room::Entity::find_by_id(room_id)
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Room not found.".to_string()))
    }

    async fn unique_code(db: &sea_orm::DatabaseConnection) -> Result<String, AppError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_room_code();
            let taken = room::Entity::find()
                .filter(room::Column::Code.eq(&code))
                .count(db)
                .await?
                > 0;
            if !taken {
                return Ok(code);
            }
        }
        Err(AppError::Internal(anyhow::anyhow!(
            "could not generate a unique room code after {MAX_CODE_ATTEMPTS} attempts"
        )))
    }
}

/// Compare-and-set the phase of a room on turn `turn_number`.
///
/// Returns `false` when the room was not in one of the `from` phases, meaning
/// another request got there first.
pub(crate) async fn advance_phase<C: ConnectionTrait>(
    db: &C,
    room_id: Uuid,
    turn_number: i32,
    from: &[RoomPhase],
    to: RoomPhase,
) -> Result<bool, DbErr> {
    debug_assert!(from.iter().all(|f| *f == to || f.can_advance_to(to)));
    let result = room::Entity::update_many()
        .col_expr(room::Column::Phase, Expr::value(to.as_str()))
        .col_expr(room::Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
        .filter(room::Column::Id.eq(room_id))
        .filter(room::Column::CurrentTurn.eq(turn_number))
        .filter(room::Column::Phase.is_in(from.iter().map(RoomPhase::as_str)))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

use std::time::Duration;

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, TransactionTrait,
};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::entities::{
    RoomPhase, RoomStatus, action_log, game_state, planned_action, room, turn, turn_result,
    user,
};
use crate::error::AppError;
use crate::game::{self, ActionInput, GameState, Role, Scenario, TurnResolution};
use crate::services::conflict_on_unique;
use crate::services::room_service::{RoomService, advance_phase};
use crate::state::AppState;

/// Response to a planned-action submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    pub submitted: bool,
    pub waiting_for_opponent: bool,
    pub turn_resolved: bool,
}

pub struct TurnService;

impl TurnService {
    /// Initialise the game state and open turn 1 for planning.
    pub async fn start_game(
        state: &AppState,
        room_id: Uuid,
        user_id: Uuid,
    ) -> Result<room::Model, AppError> {
        let membership = RoomService::load_member(state, room_id, user_id).await?;
        let found = membership.room;

        if RoomService::player_count(state, room_id).await? != 2 {
            return Err(AppError::BadRequest(
                "Two players are required to start.".to_string(),
            ));
        }
        if found.room_phase() != RoomPhase::Event {
            return Err(AppError::Conflict("The game has already started.".to_string()));
        }

        let scenario = Scenario::parse(&found.scenario_id).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "room {room_id} has unknown scenario {}",
                found.scenario_id
            ))
        })?;
        let seed = u32::try_from(found.seed).unwrap_or_default();
        let mut initial = game::initialize(scenario, seed);
        let opening_event = game::events::draw(&mut initial);
        let now = Utc::now().fixed_offset();

        let txn = state.db.begin().await?;

        let claimed = room::Entity::update_many()
            .col_expr(room::Column::Phase, Expr::value(RoomPhase::Planning.as_str()))
            .col_expr(room::Column::Status, Expr::value(RoomStatus::Active.as_str()))
            .col_expr(room::Column::CurrentTurn, Expr::value(1))
            .col_expr(room::Column::UpdatedAt, Expr::value(now))
            .filter(room::Column::Id.eq(room_id))
            .filter(room::Column::Phase.eq(RoomPhase::Event.as_str()))
            .exec(&txn)
            .await?;
        if claimed.rows_affected == 0 {
            return Err(AppError::Conflict("The game has already started.".to_string()));
        }

        game_state::ActiveModel {
            room_id: Set(room_id),
            state_json: Set(serde_json::to_value(&initial)?),
            version: Set(1),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| conflict_on_unique(e, "The game has already started."))?;

        turn::ActiveModel {
            id: Set(Uuid::new_v4()),
            room_id: Set(room_id),
            turn_number: Set(1),
            event_json: Set(opening_event.map(|e| serde_json::to_value(&e)).transpose()?),
            status: Set(turn::STATUS_PLANNING.to_string()),
            resolved_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(|e| conflict_on_unique(e, "Turn 1 already exists."))?;

        txn.commit().await?;

        let started = RoomService::find_room(state, room_id).await?;
        tracing::info!(%room_id, scenario = %started.scenario_id, "game started");

        state.room_hub.emit(
            room_id,
            "game-started",
            json!({ "room": started, "gameState": initial }),
        );
        state.room_hub.emit(
            room_id,
            "phase-change",
            json!({ "phase": RoomPhase::Planning, "turnNumber": 1, "event": initial.current_event }),
        );

        Ok(started)
    }

    /// Store (or overwrite) the caller's planned actions for the current turn and
    /// resolve the turn once both roles have submitted.
    pub async fn submit_actions(
        state: &AppState,
        room_id: Uuid,
        submitter: &user::Model,
        actions: Vec<ActionInput>,
        event_choice_id: Option<String>,
    ) -> Result<SubmitOutcome, AppError> {
        let membership = RoomService::load_member(state, room_id, submitter.id).await?;
        let role = membership.role();
        let found = membership.room;

        if found.room_status() != RoomStatus::Active {
            return Err(AppError::Conflict("The game is not in progress.".to_string()));
        }
        let phase = found.room_phase();
        if !phase.accepts_submissions() {
            return Err(AppError::Conflict(format!(
                "Submissions are closed during the {phase} phase."
            )));
        }

        let (_, current) = load_state(&state.db, room_id).await?;
        game::validate_submission(&current, role, &actions, event_choice_id.as_deref())?;

        let turn_number = found.current_turn;
        let txn = state.db.begin().await?;

        // Also locks the room row so a concurrent resolve waits for this write.
        if !advance_phase(
            &txn,
            room_id,
            turn_number,
            &[RoomPhase::Planning, RoomPhase::Commit],
            RoomPhase::Commit,
        )
        .await?
        {
            return Err(AppError::Conflict(
                "Submissions are closed for this turn.".to_string(),
            ));
        }

        let actions_json = serde_json::to_value(&actions)?;
        let now = Utc::now().fixed_offset();
        let existing = planned_action::Entity::find()
            .filter(planned_action::Column::RoomId.eq(room_id))
            .filter(planned_action::Column::TurnNumber.eq(turn_number))
            .filter(planned_action::Column::Role.eq(role.as_str()))
            .one(&txn)
            .await?;

        let overwrote = existing.is_some();
        match existing {
            Some(previous) => {
                let mut active: planned_action::ActiveModel = previous.into();
                active.user_id = Set(submitter.id);
                active.actions_json = Set(actions_json);
                active.event_choice_id = Set(event_choice_id);
                active.submitted_at = Set(now);
                active.update(&txn).await?;
            }
            None => {
                planned_action::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    room_id: Set(room_id),
                    turn_number: Set(turn_number),
                    user_id: Set(submitter.id),
                    role: Set(role.as_str().to_string()),
                    actions_json: Set(actions_json),
                    event_choice_id: Set(event_choice_id),
                    submitted_at: Set(now),
                }
                .insert(&txn)
                .await
                .map_err(|e| conflict_on_unique(e, "Actions already submitted, please retry."))?;
            }
        }

        let submitted_roles = planned_action::Entity::find()
            .filter(planned_action::Column::RoomId.eq(room_id))
            .filter(planned_action::Column::TurnNumber.eq(turn_number))
            .count(&txn)
            .await?;

        txn.commit().await?;

        tracing::info!(%room_id, turn_number, role = %role, overwrote, "actions submitted");

        if phase == RoomPhase::Planning {
            state.room_hub.emit(
                room_id,
                "phase-change",
                json!({ "phase": RoomPhase::Commit, "turnNumber": turn_number }),
            );
        }

        if submitted_roles < 2 {
            state
                .room_hub
                .emit(room_id, "player-submitted", json!({ "role": role }));
            return Ok(SubmitOutcome {
                submitted: true,
                waiting_for_opponent: true,
                turn_resolved: false,
            });
        }

        let resolved = Self::resolve_turn(state, room_id, turn_number).await?;
        Ok(SubmitOutcome {
            submitted: true,
            waiting_for_opponent: false,
            turn_resolved: resolved.is_some(),
        })
    }

    /// Resolve `turn_number` if this caller wins the commit → resolve claim.
    ///
    /// Returns `Ok(None)` when another resolver already claimed the turn. On any
    /// failure after the claim, the room goes back to `commit`.
    pub async fn resolve_turn(
        state: &AppState,
        room_id: Uuid,
        turn_number: i32,
    ) -> Result<Option<TurnResolution>, AppError> {
        if !advance_phase(
            &state.db,
            room_id,
            turn_number,
            &[RoomPhase::Commit],
            RoomPhase::Resolve,
        )
        .await?
        {
            tracing::debug!(%room_id, turn_number, "turn already claimed by another resolver");
            return Ok(None);
        }

        match Self::run_resolution(state, room_id, turn_number).await {
            Ok(resolution) => {
                Self::announce(state, room_id, &resolution);
                if !resolution.new_state.game_over {
                    Self::schedule_next_turn(state, room_id, turn_number).await;
                }
                Ok(Some(resolution))
            }
            Err(err) => {
                tracing::warn!(%room_id, turn_number, "turn resolution failed: {err:?}");
                match advance_phase(
                    &state.db,
                    room_id,
                    turn_number,
                    &[RoomPhase::Resolve],
                    RoomPhase::Commit,
                )
                .await
                {
                    Ok(true) => {}
                    Ok(false) => tracing::warn!(%room_id, "room left the resolve phase during rollback"),
                    Err(e) => tracing::error!(%room_id, "failed to restore commit phase: {e}"),
                }
                Err(err)
            }
        }
    }

    async fn run_resolution(
        state: &AppState,
        room_id: Uuid,
        turn_number: i32,
    ) -> Result<TurnResolution, AppError> {
        let (stored, current) = load_state(&state.db, room_id).await?;

        let planned = planned_action::Entity::find()
            .filter(planned_action::Column::RoomId.eq(room_id))
            .filter(planned_action::Column::TurnNumber.eq(turn_number))
            .all(&state.db)
            .await?;

        let engine_turn = u32::try_from(turn_number).unwrap_or_default();
        let plan_for = |role: Role| -> Result<(Vec<ActionInput>, Option<String>), AppError> {
            planned
                .iter()
                .find(|p| p.role == role.as_str())
                .map_or_else(
                    || Ok((Vec::new(), None)),
                    |p| {
                        let inputs: Vec<ActionInput> =
                            serde_json::from_value(p.actions_json.clone())?;
                        Ok((inputs, p.event_choice_id.clone()))
                    },
                )
        };
        let (architect_inputs, architect_choice) = plan_for(Role::Architect)?;
        let (prospect_inputs, prospect_choice) = plan_for(Role::Prospect)?;

        let event_choice = match current.current_event.as_ref().map(game::GameEvent::chooser) {
            Some(Role::Prospect) => prospect_choice,
            Some(Role::Architect) => architect_choice,
            None => None,
        };

        let architect_moves = game::build_moves(Role::Architect, engine_turn, &architect_inputs)?;
        let prospect_moves = game::build_moves(Role::Prospect, engine_turn, &prospect_inputs)?;
        let resolution = game::resolve_turn(
            &current,
            &architect_moves,
            &prospect_moves,
            event_choice.as_deref(),
        )?;

        Self::commit_resolution(&state.db, room_id, turn_number, stored.version, &resolution)
            .await?;
        Ok(resolution)
    }

    /// Persist a resolution atomically: new game-state version, turn result, one
    /// action-log row per action result, the resolved turn, and the room's next
    /// phase (`review`, or status `finished` when the game ended).
    ///
    /// # Errors
    ///
    /// [`AppError::Conflict`] when the stored version is no longer
    /// `expected_version`; nothing is written in that case.
    pub async fn commit_resolution(
        db: &DatabaseConnection,
        room_id: Uuid,
        turn_number: i32,
        expected_version: i32,
        resolution: &TurnResolution,
    ) -> Result<(), AppError> {
        let now = Utc::now().fixed_offset();
        let txn = db.begin().await?;

        let written = game_state::Entity::update_many()
            .col_expr(
                game_state::Column::StateJson,
                Expr::value(serde_json::to_value(&resolution.new_state)?),
            )
            .col_expr(game_state::Column::Version, Expr::value(expected_version + 1))
            .col_expr(game_state::Column::UpdatedAt, Expr::value(now))
            .filter(game_state::Column::RoomId.eq(room_id))
            .filter(game_state::Column::Version.eq(expected_version))
            .exec(&txn)
            .await?;
        if written.rows_affected == 0 {
            txn.rollback().await?;
            tracing::warn!(%room_id, turn_number, expected_version, "stale game state version");
            return Err(AppError::Conflict(
                "The game state changed during resolution.".to_string(),
            ));
        }

        turn_result::ActiveModel {
            id: Set(Uuid::new_v4()),
            room_id: Set(room_id),
            turn_number: Set(turn_number),
            result_json: Set(serde_json::to_value(resolution)?),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| conflict_on_unique(e, "This turn has already been resolved."))?;

        if !resolution.action_results.is_empty() {
            let rows = resolution
                .action_results
                .iter()
                .map(|result| {
                    Ok(action_log::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        room_id: Set(room_id),
                        turn_number: Set(turn_number),
                        role: Set(result.role.as_str().to_string()),
                        action_json: Set(serde_json::to_value(result)?),
                        created_at: Set(now),
                    })
                })
                .collect::<Result<Vec<_>, serde_json::Error>>()?;
            action_log::Entity::insert_many(rows).exec(&txn).await?;
        }

        turn::Entity::update_many()
            .col_expr(turn::Column::Status, Expr::value(turn::STATUS_RESOLVED))
            .col_expr(turn::Column::ResolvedAt, Expr::value(Some(now)))
            .filter(turn::Column::RoomId.eq(room_id))
            .filter(turn::Column::TurnNumber.eq(turn_number))
            .exec(&txn)
            .await?;

        let status = if resolution.new_state.game_over {
            RoomStatus::Finished
        } else {
            RoomStatus::Active
        };
        room::Entity::update_many()
            .col_expr(room::Column::Phase, Expr::value(RoomPhase::Review.as_str()))
            .col_expr(room::Column::Status, Expr::value(status.as_str()))
            .col_expr(room::Column::UpdatedAt, Expr::value(now))
            .filter(room::Column::Id.eq(room_id))
            .filter(room::Column::CurrentTurn.eq(turn_number))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        tracing::info!(
            %room_id,
            turn_number,
            version = expected_version + 1,
            game_over = resolution.new_state.game_over,
            "turn resolved"
        );
        Ok(())
    }

    /// Open the turn after `resolved_turn`: create its record (with the event the
    /// engine drew) and move the room from `review` to `planning`.
    ///
    /// Returns `false` if the game is over or the next turn was already opened.
    pub async fn start_next_turn(
        state: &AppState,
        room_id: Uuid,
        resolved_turn: i32,
    ) -> Result<bool, AppError> {
        let (_, current) = load_state(&state.db, room_id).await?;
        if current.game_over {
            return Ok(false);
        }

        let next_turn = resolved_turn + 1;
        let now = Utc::now().fixed_offset();
        let txn = state.db.begin().await?;

        let opened = room::Entity::update_many()
            .col_expr(room::Column::Phase, Expr::value(RoomPhase::Planning.as_str()))
            .col_expr(room::Column::CurrentTurn, Expr::value(next_turn))
            .col_expr(room::Column::UpdatedAt, Expr::value(now))
            .filter(room::Column::Id.eq(room_id))
            .filter(room::Column::CurrentTurn.eq(resolved_turn))
            .filter(room::Column::Phase.eq(RoomPhase::Review.as_str()))
            .filter(room::Column::Status.eq(RoomStatus::Active.as_str()))
            .exec(&txn)
            .await?;
        if opened.rows_affected == 0 {
            return Ok(false);
        }

        turn::ActiveModel {
            id: Set(Uuid::new_v4()),
            room_id: Set(room_id),
            turn_number: Set(next_turn),
            event_json: Set(current
                .current_event
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?),
            status: Set(turn::STATUS_PLANNING.to_string()),
            resolved_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(|e| conflict_on_unique(e, "The next turn is already open."))?;

        txn.commit().await?;

        tracing::info!(%room_id, turn_number = next_turn, has_event = current.current_event.is_some(), "turn opened");
        state.room_hub.emit(
            room_id,
            "phase-change",
            json!({
                "phase": RoomPhase::Planning,
                "turnNumber": next_turn,
                "event": current.current_event,
            }),
        );
        Ok(true)
    }

    /// Open the next turn after the configured review pause. With no pause the
    /// turn is opened before returning.
    async fn schedule_next_turn(state: &AppState, room_id: Uuid, resolved_turn: i32) {
        let delay = state.config.turn_review_delay_ms;
        if delay == 0 {
            if let Err(e) = Self::start_next_turn(state, room_id, resolved_turn).await {
                tracing::warn!(%room_id, resolved_turn, "failed to open next turn: {e:?}");
            }
            return;
        }

        let state = state.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if let Err(e) = Self::start_next_turn(&state, room_id, resolved_turn).await {
                tracing::warn!(%room_id, resolved_turn, "failed to open next turn: {e:?}");
            }
        });
    }

    fn announce(state: &AppState, room_id: Uuid, resolution: &TurnResolution) {
        state.room_hub.emit(
            room_id,
            "turn-resolved",
            json!({
                "turnNumber": resolution.turn_number,
                "summary": resolution.turn_summary,
                "actionResults": resolution.action_results,
                "eventChoiceId": resolution.event_choice_id,
                "gameState": resolution.new_state,
            }),
        );
        if resolution.new_state.game_over {
            state.room_hub.emit(
                room_id,
                "game-over",
                json!({
                    "winner": resolution.new_state.winner,
                    "endReason": resolution.new_state.end_reason,
                    "gameState": resolution.new_state,
                }),
            );
        }
    }
}

/// Decode a stored snapshot.
pub(crate) fn parse_state(model: &game_state::Model) -> Result<GameState, AppError> {
    serde_json::from_value(model.state_json.clone()).map_err(|e| {
        AppError::Internal(anyhow::anyhow!(
            "corrupt game state for room {}: {e}",
            model.room_id
        ))
    })
}

async fn load_state<C: ConnectionTrait>(
    db: &C,
    room_id: Uuid,
) -> Result<(game_state::Model, GameState), AppError> {
    let stored = game_state::Entity::find_by_id(room_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Conflict("The game has not started yet.".to_string()))?;
    let parsed = parse_state(&stored)?;
    Ok((stored, parsed))
}

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::entities::{habit, habit_log, user};
use crate::error::AppError;
use crate::services::buddy_service::BuddyService;
use crate::services::conflict_on_unique;
use crate::services::notification_service::{
    KIND_HABIT_MILESTONE, NewNotification, NotificationService,
};
use crate::state::AppState;
use crate::utils::dates::parse_iso_date;

/// Totals of done days for one habit that notify a user's buddies.
pub const MILESTONES: [u64; 8] = [7, 14, 21, 30, 60, 90, 100, 365];

/// Habits every new account starts with: `(name, emoji, target per week)`.
pub const DEFAULT_HABITS: [(&str, &str, i32); 9] = [
    ("Wake up early", "sunrise", 7),
    ("Gym", "dumbbell", 5),
    ("Reading", "book", 7),
    ("Budget tracking", "wallet", 7),
    ("Project work", "laptop", 5),
    ("No alcohol", "glass-water", 7),
    ("Social media detox", "phone-off", 7),
    ("Goal journaling", "notebook", 7),
    ("Cold shower", "snowflake", 5),
];

const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct HabitChanges {
    pub name: Option<String>,
    pub emoji: Option<Option<String>>,
    pub target_per_week: Option<i32>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

/// Outcome of a toggle, including the milestone it reached (if any).
#[derive(Debug, Clone)]
pub struct ToggleOutcome {
    pub log: habit_log::Model,
    pub milestone: Option<u64>,
}

pub struct HabitService;

impl HabitService {
    /// Insert the default habits for a freshly registered user.
    pub async fn seed_defaults<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<(), AppError> {
        let now = Utc::now().fixed_offset();
        let rows = DEFAULT_HABITS
            .iter()
            .zip(0..)
            .map(|(&(name, emoji, target), order)| habit::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                name: Set(name.to_string()),
                emoji: Set(Some(emoji.to_string())),
                target_per_week: Set(target),
                is_active: Set(true),
                sort_order: Set(order),
                created_at: Set(now),
            });
        habit::Entity::insert_many(rows).exec(db).await?;
        Ok(())
    }

    pub async fn list(state: &AppState, user_id: Uuid) -> Result<Vec<habit::Model>, AppError> {
        Ok(habit::Entity::find()
            .filter(habit::Column::UserId.eq(user_id))
            .order_by_asc(habit::Column::SortOrder)
            .order_by_asc(habit::Column::CreatedAt)
            .all(&state.db)
            .await?)
    }

    pub async fn create(
        state: &AppState,
        user_id: Uuid,
        name: &str,
        emoji: Option<String>,
        target_per_week: Option<i32>,
        is_active: Option<bool>,
    ) -> Result<habit::Model, AppError> {
        let name = validate_name(name)?;
        let target = validate_target(target_per_week.unwrap_or(7))?;

        let last_order: Option<i32> = habit::Entity::find()
            .select_only()
            .column_as(habit::Column::SortOrder.max(), "max_order")
            .filter(habit::Column::UserId.eq(user_id))
            .into_tuple::<Option<i32>>()
            .one(&state.db)
            .await?
            .flatten();

        let created = habit::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(name),
            emoji: Set(emoji.filter(|e| !e.trim().is_empty())),
            target_per_week: Set(target),
            is_active: Set(is_active.unwrap_or(true)),
            sort_order: Set(last_order.map_or(0, |o| o + 1)),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&state.db)
        .await?;

        tracing::info!(habit_id = %created.id, %user_id, "habit created");
        Ok(created)
    }

    pub async fn update(
        state: &AppState,
        user_id: Uuid,
        habit_id: Uuid,
        changes: HabitChanges,
    ) -> Result<habit::Model, AppError> {
        let existing = Self::owned(state, user_id, habit_id).await?;
        let mut active: habit::ActiveModel = existing.into();

        if let Some(name) = changes.name {
            active.name = Set(validate_name(&name)?);
        }
        if let Some(emoji) = changes.emoji {
            active.emoji = Set(emoji.filter(|e| !e.trim().is_empty()));
        }
        if let Some(target) = changes.target_per_week {
            active.target_per_week = Set(validate_target(target)?);
        }
        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(order) = changes.sort_order {
            active.sort_order = Set(order);
        }

        Ok(active.update(&state.db).await?)
    }

    /// Delete a habit and its logs.
    pub async fn delete(state: &AppState, user_id: Uuid, habit_id: Uuid) -> Result<(), AppError> {
        let existing = Self::owned(state, user_id, habit_id).await?;
        habit_log::Entity::delete_many()
            .filter(habit_log::Column::HabitId.eq(habit_id))
            .exec(&state.db)
            .await?;
        existing.delete(&state.db).await?;
        tracing::info!(%habit_id, %user_id, "habit deleted");
        Ok(())
    }

    pub async fn logs_for_date(
        state: &AppState,
        user_id: Uuid,
        date_iso: &str,
    ) -> Result<Vec<habit_log::Model>, AppError> {
        parse_iso_date(date_iso).map_err(AppError::BadRequest)?;
        Ok(habit_log::Entity::find()
            .filter(habit_log::Column::UserId.eq(user_id))
            .filter(habit_log::Column::DateIso.eq(date_iso))
            .all(&state.db)
            .await?)
    }

    /// Absent log: created done. Present log: `done` flipped.
    ///
    /// Reaching a milestone notifies every accepted buddy; that part is best-effort.
    pub async fn toggle(
        state: &AppState,
        user: &user::Model,
        habit_id: Uuid,
        date_iso: &str,
    ) -> Result<ToggleOutcome, AppError> {
        parse_iso_date(date_iso).map_err(AppError::BadRequest)?;
        let habit = Self::owned(state, user.id, habit_id).await?;

        let existing = habit_log::Entity::find()
            .filter(habit_log::Column::UserId.eq(user.id))
            .filter(habit_log::Column::HabitId.eq(habit_id))
            .filter(habit_log::Column::DateIso.eq(date_iso))
            .one(&state.db)
            .await?;

        let log = match existing {
            Some(log) => {
                let done = !log.done;
                let mut active: habit_log::ActiveModel = log.into();
                active.done = Set(done);
                active.update(&state.db).await?
            }
            None => Self::insert_done_log(&state.db, user.id, habit_id, date_iso).await?,
        };

        let milestone = if log.done {
            Self::check_milestone(state, user, &habit).await
        } else {
            None
        };

        Ok(ToggleOutcome { log, milestone })
    }

    /// Insert a fresh `done` log. A concurrent toggle that got there first
    /// surfaces as 409 rather than a database error.
    pub async fn insert_done_log<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        habit_id: Uuid,
        date_iso: &str,
    ) -> Result<habit_log::Model, AppError> {
        habit_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            habit_id: Set(habit_id),
            date_iso: Set(date_iso.to_string()),
            done: Set(true),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(db)
        .await
        .map_err(|e| conflict_on_unique(e, "Habit already logged for this day, please retry."))
    }

    async fn check_milestone(
        state: &AppState,
        user: &user::Model,
        habit: &habit::Model,
    ) -> Option<u64> {
        let done_count = match habit_log::Entity::find()
            .filter(habit_log::Column::UserId.eq(user.id))
            .filter(habit_log::Column::HabitId.eq(habit.id))
            .filter(habit_log::Column::Done.eq(true))
            .count(&state.db)
            .await
        {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(habit_id = %habit.id, "failed to count habit logs: {e}");
                return None;
            }
        };

        if !MILESTONES.contains(&done_count) {
            return None;
        }

        let buddies = match BuddyService::accepted_buddy_ids(state, user.id).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(user_id = %user.id, "failed to load buddies for milestone: {e:?}");
                return Some(done_count);
            }
        };

        let name = user.display_name.as_deref().unwrap_or(&user.username);
        for buddy_id in buddies {
            NotificationService::send_best_effort(
                state,
                NewNotification {
                    user_id: buddy_id,
                    kind: KIND_HABIT_MILESTONE,
                    title: "Buddy Milestone!".to_string(),
                    body: format!(
                        "{name} reached {done_count} day streak for \"{}\"",
                        habit.name
                    ),
                    entity_type: Some("habit"),
                    entity_id: Some(habit.id),
                    related_user_id: Some(user.id),
                },
            )
            .await;
        }

        tracing::info!(user_id = %user.id, habit_id = %habit.id, done_count, "habit milestone reached");
        Some(done_count)
    }

    async fn owned(
        state: &AppState,
        user_id: Uuid,
        habit_id: Uuid,
    ) -> Result<habit::Model, AppError> {
        habit::Entity::find_by_id(habit_id)
            .filter(habit::Column::UserId.eq(user_id))
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Habit not found.".to_string()))
    }
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("Habit name is required.".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "Habit name must be at most {MAX_NAME_LEN} characters."
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_target(target: i32) -> Result<i32, AppError> {
    if (1..=7).contains(&target) {
        Ok(target)
    } else {
        Err(AppError::BadRequest(
            "targetPerWeek must be between 1 and 7.".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Gym ").ok().as_deref(), Some("Gym"));
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_target() {
        assert!(validate_target(0).is_err());
        assert!(validate_target(8).is_err());
        assert_eq!(validate_target(5).ok(), Some(5));
    }

    #[test]
    fn test_default_habit_set() {
        assert_eq!(DEFAULT_HABITS.len(), 9);
        assert!(DEFAULT_HABITS.iter().all(|(_, _, t)| (1..=7).contains(t)));
    }
}

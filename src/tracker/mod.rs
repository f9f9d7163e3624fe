//! Offline habit tracker: the single-user state blob (habits, per-day logs and
//! planner days) with its edit operations, and a file-backed [`TrackerStore`].

mod store;

pub use store::{STORAGE_KEY, TrackerStore};

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::services::habit_service::DEFAULT_HABITS;

const ID_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LENGTH: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerHabit {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    pub target_per_week: u8,
    pub is_active: bool,
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyHabitLog {
    #[serde(rename = "dateISO")]
    pub date_iso: String,
    pub habit_id: String,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerTask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerDay {
    #[serde(rename = "dateISO")]
    pub date_iso: String,
    pub tasks: Vec<PlannerTask>,
}

/// Input for a new habit.
#[derive(Debug, Clone, Default)]
pub struct NewHabit {
    pub name: String,
    pub emoji: Option<String>,
    pub target_per_week: Option<u8>,
    pub is_active: Option<bool>,
}

/// Partial habit update; `None` fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct HabitUpdate {
    pub name: Option<String>,
    pub emoji: Option<Option<String>>,
    pub target_per_week: Option<u8>,
    pub is_active: Option<bool>,
}

/// Input for a new planner task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub time: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub done: Option<bool>,
    pub time: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

/// The whole tracker document, as persisted and exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerState {
    pub habits: Vec<TrackerHabit>,
    pub habit_logs: Vec<DailyHabitLog>,
    pub planner_days: Vec<PlannerDay>,
}

impl Default for TrackerState {
    /// The default habit set with fresh ids, no logs, no planner days.
    fn default() -> Self {
        let habits = DEFAULT_HABITS
            .iter()
            .enumerate()
            .map(|(order, &(name, emoji, target))| TrackerHabit {
                id: generate_id(),
                name: name.to_string(),
                emoji: Some(emoji.to_string()),
                target_per_week: u8::try_from(target).unwrap_or(7),
                is_active: true,
                order,
            })
            .collect();
        Self {
            habits,
            habit_logs: Vec::new(),
            planner_days: Vec::new(),
        }
    }
}

impl TrackerState {
    // ─── Habits ──────────────────────────────────────────────────────────────

    /// Append a habit at the end of the order. Returns its id.
    pub fn add_habit(&mut self, habit: NewHabit) -> String {
        let id = generate_id();
        self.habits.push(TrackerHabit {
            id: id.clone(),
            name: habit.name,
            emoji: habit.emoji,
            target_per_week: habit.target_per_week.unwrap_or(7),
            is_active: habit.is_active.unwrap_or(true),
            order: self.habits.len(),
        });
        id
    }

    /// Returns `false` if no habit has that id.
    pub fn update_habit(&mut self, id: &str, update: HabitUpdate) -> bool {
        let Some(habit) = self.habits.iter_mut().find(|h| h.id == id) else {
            return false;
        };
        if let Some(name) = update.name {
            habit.name = name;
        }
        if let Some(emoji) = update.emoji {
            habit.emoji = emoji;
        }
        if let Some(target) = update.target_per_week {
            habit.target_per_week = target;
        }
        if let Some(is_active) = update.is_active {
            habit.is_active = is_active;
        }
        true
    }

    /// Remove a habit together with all of its logs.
    pub fn delete_habit(&mut self, id: &str) {
        self.habits.retain(|h| h.id != id);
        self.habit_logs.retain(|l| l.habit_id != id);
    }

    /// Keep only the listed habits, in the listed order. Unknown ids are ignored.
    pub fn reorder_habits(&mut self, ids: &[&str]) {
        let mut remaining = std::mem::take(&mut self.habits);
        self.habits = ids
            .iter()
            .filter_map(|id| {
                let pos = remaining.iter().position(|h| h.id == *id)?;
                Some(remaining.swap_remove(pos))
            })
            .enumerate()
            .map(|(order, habit)| TrackerHabit { order, ..habit })
            .collect();
    }

    // ─── Habit logs ──────────────────────────────────────────────────────────

    /// Present and done: removed. Present and not done: marked done. Absent:
    /// appended as done.
    pub fn toggle_habit_log(&mut self, date_iso: &str, habit_id: &str) {
        let existing = self
            .habit_logs
            .iter()
            .position(|l| l.date_iso == date_iso && l.habit_id == habit_id);

        match existing {
            Some(i) if self.habit_logs[i].done => {
                self.habit_logs.remove(i);
            }
            Some(i) => self.habit_logs[i].done = true,
            None => self.habit_logs.push(DailyHabitLog {
                date_iso: date_iso.to_string(),
                habit_id: habit_id.to_string(),
                done: true,
            }),
        }
    }

    #[must_use]
    pub fn habit_log(&self, date_iso: &str, habit_id: &str) -> Option<&DailyHabitLog> {
        self.habit_logs
            .iter()
            .find(|l| l.date_iso == date_iso && l.habit_id == habit_id)
    }

    // ─── Planner ─────────────────────────────────────────────────────────────

    /// The planner page for a date; an empty day if nothing was planned.
    #[must_use]
    pub fn planner_day(&self, date_iso: &str) -> PlannerDay {
        self.planner_days
            .iter()
            .find(|d| d.date_iso == date_iso)
            .cloned()
            .unwrap_or_else(|| PlannerDay {
                date_iso: date_iso.to_string(),
                tasks: Vec::new(),
            })
    }

    /// Returns the new task's id.
    pub fn add_task(&mut self, date_iso: &str, task: NewTask) -> String {
        let id = generate_id();
        let new_task = PlannerTask {
            id: id.clone(),
            title: task.title,
            done: false,
            time: task.time,
            notes: task.notes,
        };
        match self.planner_days.iter_mut().find(|d| d.date_iso == date_iso) {
            Some(day) => day.tasks.push(new_task),
            None => self.planner_days.push(PlannerDay {
                date_iso: date_iso.to_string(),
                tasks: vec![new_task],
            }),
        }
        id
    }

    pub fn update_task(&mut self, date_iso: &str, task_id: &str, update: TaskUpdate) -> bool {
        let Some(task) = self.task_mut(date_iso, task_id) else {
            return false;
        };
        if let Some(title) = update.title {
            task.title = title;
        }
        if let Some(done) = update.done {
            task.done = done;
        }
        if let Some(time) = update.time {
            task.time = time;
        }
        if let Some(notes) = update.notes {
            task.notes = notes;
        }
        true
    }

    pub fn delete_task(&mut self, date_iso: &str, task_id: &str) {
        if let Some(day) = self.planner_days.iter_mut().find(|d| d.date_iso == date_iso) {
            day.tasks.retain(|t| t.id != task_id);
        }
    }

    pub fn toggle_task(&mut self, date_iso: &str, task_id: &str) -> bool {
        match self.task_mut(date_iso, task_id) {
            Some(task) => {
                task.done = !task.done;
                true
            }
            None => false,
        }
    }

    fn task_mut(&mut self, date_iso: &str, task_id: &str) -> Option<&mut PlannerTask> {
        self.planner_days
            .iter_mut()
            .find(|d| d.date_iso == date_iso)?
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
    }

    // ─── Import / export ─────────────────────────────────────────────────────

    /// Pretty-printed JSON of the whole document.
    ///
    /// # Errors
    ///
    /// Only if serialization itself fails.
    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Replace the state with an exported document.
    ///
    /// The document must be a JSON object carrying `habits`, `habitLogs` and
    /// `plannerDays`; on any error the current state is left untouched.
    ///
    /// # Errors
    ///
    /// Returns a description of why the document was rejected.
    pub fn import_json(&mut self, raw: &str) -> anyhow::Result<()> {
        let value: Value = serde_json::from_str(raw)?;
        let Some(object) = value.as_object() else {
            anyhow::bail!("tracker import must be a JSON object");
        };
        for key in ["habits", "habitLogs", "plannerDays"] {
            if object.get(key).is_none_or(Value::is_null) {
                anyhow::bail!("tracker import is missing '{key}'");
            }
        }
        *self = serde_json::from_value(value)?;
        Ok(())
    }
}

/// Random 9-character lower-case base-36 id.
fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LENGTH)
        .map(|_| char::from(ID_CHARS[rng.gen_range(0..ID_CHARS.len())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> TrackerState {
        TrackerState {
            habits: Vec::new(),
            habit_logs: Vec::new(),
            planner_days: Vec::new(),
        }
    }

    #[test]
    fn test_default_state() {
        let state = TrackerState::default();
        assert_eq!(state.habits.len(), 9);
        assert!(state.habit_logs.is_empty());
        assert!(state.planner_days.is_empty());
        assert_eq!(state.habits[1].name, "Gym");
        assert_eq!(state.habits[1].target_per_week, 5);
        assert!(state.habits.iter().enumerate().all(|(i, h)| h.order == i));
        assert!(state.habits.iter().all(|h| h.id.len() == ID_LENGTH));
    }

    #[test]
    fn test_toggle_cycle() {
        let mut state = empty();
        state.toggle_habit_log("2026-10-01", "h1");
        assert_eq!(state.habit_log("2026-10-01", "h1").map(|l| l.done), Some(true));

        state.toggle_habit_log("2026-10-01", "h1");
        assert!(state.habit_log("2026-10-01", "h1").is_none());
        assert_eq!(state, empty());
    }

    #[test]
    fn test_toggle_not_done_marks_done() {
        let mut state = empty();
        state.habit_logs.push(DailyHabitLog {
            date_iso: "2026-10-01".to_string(),
            habit_id: "h1".to_string(),
            done: false,
        });
        state.toggle_habit_log("2026-10-01", "h1");
        assert_eq!(state.habit_logs.len(), 1);
        assert!(state.habit_logs[0].done);
    }

    #[test]
    fn test_delete_habit_removes_logs() {
        let mut state = empty();
        let keep = state.add_habit(NewHabit {
            name: "Reading".to_string(),
            ..NewHabit::default()
        });
        let gone = state.add_habit(NewHabit {
            name: "Gym".to_string(),
            ..NewHabit::default()
        });
        state.toggle_habit_log("2026-10-01", &keep);
        state.toggle_habit_log("2026-10-01", &gone);
        state.toggle_habit_log("2026-10-02", &gone);

        state.delete_habit(&gone);
        assert_eq!(state.habits.len(), 1);
        assert_eq!(state.habit_logs.len(), 1);
        assert_eq!(state.habit_logs[0].habit_id, keep);
    }

    #[test]
    fn test_reorder_habits() {
        let mut state = empty();
        let a = state.add_habit(NewHabit { name: "A".to_string(), ..NewHabit::default() });
        let b = state.add_habit(NewHabit { name: "B".to_string(), ..NewHabit::default() });
        let c = state.add_habit(NewHabit { name: "C".to_string(), ..NewHabit::default() });

        state.reorder_habits(&[&c, "missing", &a]);
        let names: Vec<&str> = state.habits.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, ["C", "A"]);
        assert_eq!(state.habits[1].order, 1);
        assert!(state.habits.iter().all(|h| h.id != b));
    }

    #[test]
    fn test_update_habit() {
        let mut state = empty();
        let id = state.add_habit(NewHabit {
            name: "Gym".to_string(),
            target_per_week: Some(3),
            ..NewHabit::default()
        });
        assert!(state.update_habit(
            &id,
            HabitUpdate {
                is_active: Some(false),
                ..HabitUpdate::default()
            }
        ));
        assert!(!state.habits[0].is_active);
        assert_eq!(state.habits[0].target_per_week, 3);
        assert!(!state.update_habit("nope", HabitUpdate::default()));
    }

    #[test]
    fn test_planner_tasks() {
        let mut state = empty();
        assert!(state.planner_day("2026-10-03").tasks.is_empty());

        let id = state.add_task(
            "2026-10-03",
            NewTask {
                title: "Write report".to_string(),
                ..NewTask::default()
            },
        );
        state.add_task(
            "2026-10-03",
            NewTask {
                title: "Call bank".to_string(),
                time: Some("09:30".to_string()),
                ..NewTask::default()
            },
        );
        assert_eq!(state.planner_days.len(), 1);
        assert_eq!(state.planner_day("2026-10-03").tasks.len(), 2);

        assert!(state.toggle_task("2026-10-03", &id));
        assert!(state.planner_day("2026-10-03").tasks[0].done);

        assert!(state.update_task(
            "2026-10-03",
            &id,
            TaskUpdate {
                title: Some("Write the report".to_string()),
                ..TaskUpdate::default()
            }
        ));
        assert_eq!(state.planner_day("2026-10-03").tasks[0].title, "Write the report");

        state.delete_task("2026-10-03", &id);
        assert_eq!(state.planner_day("2026-10-03").tasks.len(), 1);
        assert!(!state.toggle_task("2026-10-04", &id));
    }

    #[test]
    fn test_export_import_identity() {
        let mut state = TrackerState::default();
        let first = state.habits[0].id.clone();
        state.toggle_habit_log("2026-10-01", &first);
        state.add_task("2026-10-01", NewTask { title: "Plan".to_string(), ..NewTask::default() });

        let exported = state.export_json().unwrap_or_default();
        assert!(exported.contains("\"habitLogs\""));
        assert!(exported.contains("\"dateISO\""));

        let mut restored = empty();
        assert!(restored.import_json(&exported).is_ok());
        assert_eq!(restored, state);
    }

    #[test]
    fn test_import_rejects_incomplete_documents() {
        let mut state = TrackerState::default();
        let before = state.clone();

        assert!(state.import_json(r#"{"habits": [], "habitLogs": []}"#).is_err());
        assert!(state.import_json("[1, 2, 3]").is_err());
        assert!(state.import_json("not json").is_err());
        assert!(
            state
                .import_json(r#"{"habits": [], "habitLogs": [], "plannerDays": null}"#)
                .is_err()
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_generate_id_alphabet() {
        let id = generate_id();
        assert_eq!(id.len(), ID_LENGTH);
        assert!(id.bytes().all(|b| ID_CHARS.contains(&b)));
    }
}

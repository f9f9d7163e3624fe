use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use super::TrackerState;

/// Name under which the tracker document is stored.
pub const STORAGE_KEY: &str = "habit-tracker-data";

/// File-backed tracker document.
///
/// Loading and saving are best-effort: a missing or unreadable file starts from
/// the default state, and write failures are logged rather than returned.
/// Writes go through `tokio::fs` so handlers never block a runtime worker.
#[derive(Debug)]
pub struct TrackerStore {
    path: PathBuf,
    state: TrackerState,
}

impl TrackerStore {
    /// Open the store in `dir`, loading `habit-tracker-data.json` if present.
    ///
    /// Runs once at startup, before the server accepts requests.
    #[must_use]
    pub fn open(dir: &Path) -> Self {
        let path = dir.join(format!("{STORAGE_KEY}.json"));
        let state = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::error!(path = %path.display(), "failed to parse saved tracker state: {e}");
                TrackerState::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => TrackerState::default(),
            Err(e) => {
                tracing::error!(path = %path.display(), "failed to read saved tracker state: {e}");
                TrackerState::default()
            }
        };
        Self { path, state }
    }

    #[must_use]
    pub const fn state(&self) -> &TrackerState {
        &self.state
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply an edit and persist the result.
    pub async fn update<R>(&mut self, edit: impl FnOnce(&mut TrackerState) -> R) -> R {
        let out = edit(&mut self.state);
        self.save().await;
        out
    }

    /// Write the current state to disk. Failures are logged.
    pub async fn save(&self) {
        if let Err(e) = self.try_save().await {
            tracing::error!(path = %self.path.display(), "failed to save tracker state: {e:#}");
        }
    }

    async fn try_save(&self) -> anyhow::Result<()> {
        let body = serde_json::to_string(&self.state)?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        tokio::fs::write(&self.path, body)
            .await
            .with_context(|| format!("writing {}", self.path.display()))
    }

    /// Delete the saved file and reset to the default state.
    pub async fn clear(&mut self) {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::error!(path = %self.path.display(), "failed to clear tracker state: {e}");
            }
        }
        self.state = TrackerState::default();
    }

    /// Replace the state with an exported document, then persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is not a complete tracker document; the
    /// current state is kept and nothing is written in that case.
    pub async fn import_json(&mut self, raw: &str) -> anyhow::Result<()> {
        self.state.import_json(raw)?;
        self.save().await;
        tracing::info!(path = %self.path.display(), habits = self.state.habits.len(), "tracker data imported");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::NewHabit;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "data-architect-tracker-{name}-{}",
            uuid::Uuid::new_v4()
        ));
        let _ = fs::create_dir_all(&dir);
        dir
    }

    #[test]
    fn test_open_missing_file_uses_defaults() {
        let dir = scratch_dir("missing");
        let store = TrackerStore::open(&dir);
        assert_eq!(store.state().habits.len(), 9);
        assert!(store.path().ends_with("habit-tracker-data.json"));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = scratch_dir("corrupt");
        let _ = fs::write(dir.join("habit-tracker-data.json"), "{ not json");
        let store = TrackerStore::open(&dir);
        assert_eq!(store.state().habits.len(), 9);
        let _ = fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_updates_persist_across_reopen() {
        let dir = scratch_dir("persist");
        let mut store = TrackerStore::open(&dir);
        let id = store
            .update(|s| {
                s.add_habit(NewHabit {
                    name: "Stretching".to_string(),
                    ..NewHabit::default()
                })
            })
            .await;
        store.update(|s| s.toggle_habit_log("2026-10-05", &id)).await;

        let reopened = TrackerStore::open(&dir);
        assert_eq!(reopened.state(), store.state());
        assert!(reopened.state().habit_log("2026-10-05", &id).is_some());
        let _ = fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_clear_resets_and_removes_file() {
        let dir = scratch_dir("clear");
        let mut store = TrackerStore::open(&dir);
        store.update(|s| s.habits.clear()).await;
        assert!(store.path().exists());

        store.clear().await;
        assert!(!store.path().exists());
        assert_eq!(store.state().habits.len(), 9);
        let _ = fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_import_replaces_and_persists() {
        let dir = scratch_dir("export");
        let mut store = TrackerStore::open(&dir);
        store.update(|s| s.toggle_habit_log("2026-10-06", "abc")).await;
        let exported = store.state().export_json().unwrap_or_default();

        let import_dir = scratch_dir("import");
        let mut other = TrackerStore::open(&import_dir);
        assert!(other.import_json(&exported).await.is_ok());
        assert_eq!(other.state(), store.state());
        assert_eq!(TrackerStore::open(&import_dir).state(), store.state());

        assert!(other.import_json(r#"{"habits": []}"#).await.is_err());
        assert_eq!(other.state(), store.state());
        let _ = fs::remove_dir_all(dir);
        let _ = fs::remove_dir_all(import_dir);
    }
}

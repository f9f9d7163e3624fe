use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::hub::{NotificationHub, RoomHub};
use crate::tracker::TrackerStore;

/// Shared application state available to all request handlers via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    pub room_hub: RoomHub,
    pub notification_hub: NotificationHub,
    pub tracker: Arc<Mutex<TrackerStore>>,
}

impl AppState {
    /// Build the state, loading the tracker document from `config.tracker_data_dir`.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let tracker = TrackerStore::open(&config.tracker_data_dir);
        Self {
            db,
            config,
            room_hub: RoomHub::new(),
            notification_hub: NotificationHub::new(),
            tracker: Arc::new(Mutex::new(tracker)),
        }
    }
}

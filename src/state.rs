use crate::config::AppConfig;
use crate::events::LogEvents;
use crate::goals::GoalFallback;
use crate::models::AppData;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::{broadcast, Mutex};

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
    pub events: LogEvents,
    pub goal_fallback: GoalFallback,
    shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    pub fn new(config: &AppConfig, data: AppData) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            data_path: config.data_path.clone(),
            data: Arc::new(Mutex::new(data)),
            events: LogEvents::new(config.event_capacity),
            goal_fallback: config.goal_fallback,
            shutdown_tx,
        }
    }

    pub fn shutdown_rx(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Tells long-lived streams to finish. Returns how many were listening.
    pub fn shutdown(&self) -> usize {
        self.shutdown_tx.send(()).unwrap_or(0)
    }
}

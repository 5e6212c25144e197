use crate::goals::GoalFallback;
use std::env;
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub data_path: PathBuf,
    /// Placeholder goal shown when a month has none. Never fed into
    /// aggregation.
    pub goal_fallback: GoalFallback,
    pub event_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            data_path: PathBuf::from("data/state.json"),
            goal_fallback: GoalFallback::None,
            event_capacity: 64,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(defaults.port);

        let data_path = lookup("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_path);

        let goal_fallback = match lookup("RUNLOG_DEFAULT_MONTHLY_GOAL") {
            Some(value) => GoalFallback::parse(&value).unwrap_or_else(|| {
                warn!(%value, "ignoring invalid RUNLOG_DEFAULT_MONTHLY_GOAL");
                GoalFallback::None
            }),
            None => defaults.goal_fallback,
        };

        let event_capacity = lookup("RUNLOG_EVENT_CAPACITY")
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|capacity| *capacity > 0)
            .unwrap_or(defaults.event_capacity);

        Self {
            port,
            data_path,
            goal_fallback,
            event_capacity,
        }
    }
}

//! Change notifications for views that render the same data.
//!
//! Owned by [`crate::AppState`] and handed to whoever needs it; there is no
//! process-wide bus.

use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogEvent {
    RecordSaved { id: String, date: String },
    RecordDeleted { id: String, date: String },
    MonthlyGoalSet { year: i32, month: u32 },
    YearlyGoalSet { year: i32 },
}

impl LogEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RecordSaved { .. } => "record_saved",
            Self::RecordDeleted { .. } => "record_deleted",
            Self::MonthlyGoalSet { .. } => "monthly_goal_set",
            Self::YearlyGoalSet { .. } => "yearly_goal_set",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEvents {
    sender: broadcast::Sender<LogEvent>,
}

impl LogEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns how many subscribers saw the event. Zero is normal when no
    /// page is open.
    pub fn publish(&self, event: LogEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.sender.subscribe()
    }
}

pub mod app;
pub mod calendar;
pub mod config;
pub mod date_key;
pub mod errors;
pub mod events;
pub mod goals;
pub mod handlers;
pub mod models;
pub mod progress;
pub mod records;
pub mod stats;
pub mod storage;
pub mod ui;
pub mod state;

pub use app::router;
pub use config::AppConfig;
pub use progress::{aggregate_month, DailyBucket, MonthlyProgress};
pub use records::RecordIndex;
pub use state::AppState;
pub use storage::load_data;

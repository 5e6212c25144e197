use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, put}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/records", get(handlers::list_records).post(handlers::create_record))
        .route(
            "/api/records/:id",
            put(handlers::update_record).delete(handlers::delete_record),
        )
        .route(
            "/api/goals/monthly",
            get(handlers::list_monthly_goals).put(handlers::set_monthly_goal),
        )
        .route(
            "/api/goals/yearly",
            get(handlers::list_yearly_goals).put(handlers::set_yearly_goal),
        )
        .route("/api/goals/current", get(handlers::current_goals))
        .route("/api/progress", get(handlers::get_progress))
        .route("/api/calendar", get(handlers::get_calendar))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/events", get(handlers::events))
        .with_state(state)
}

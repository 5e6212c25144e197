use crate::calendar::{build_month_calendar, MonthCalendar};
use crate::date_key::{date_key, parse_date_key};
use crate::errors::AppError;
use crate::events::LogEvent;
use crate::goals::{resolve_monthly_goal, resolve_yearly_goal};
use crate::models::{
    CurrentGoalsResponse, MonthQuery, MonthlyGoal, MonthlyGoalRequest, RecordRequest, RunRecord,
    StatsResponse, YearlyGoal, YearlyGoalRequest,
};
use crate::progress::{aggregate_month, MonthlyProgress};
use crate::records::RecordIndex;
use crate::state::AppState;
use crate::stats::build_stats;
use crate::storage::persist_data;
use crate::ui::{render_index, IndexView};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html,
    },
    Json,
};
use chrono::{Datelike, Local, NaiveDate};
use futures::Stream;
use std::{convert::Infallible, time::Duration};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};
use uuid::Uuid;

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Html<String>, AppError> {
    let today = today();
    let (year, month) = resolve_month(&query, today)?;
    let data = state.data.lock().await;

    let progress = aggregate_month(&data.records, &data.monthly_goals, year, month, today);
    let calendar = build_month_calendar(&data.records, year, month, today);
    let display_goal = state.goal_fallback.apply(progress.goal_for_month);

    Ok(Html(render_index(&IndexView {
        today: date_key(today),
        progress: &progress,
        calendar: &calendar,
        display_goal,
        goal_is_fallback: progress.goal_for_month.is_none() && display_goal.is_some(),
    })))
}

pub async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<RunRecord>>, AppError> {
    let (year, month) = resolve_month(&query, today())?;
    let data = state.data.lock().await;
    let index = RecordIndex::for_month(&data.records, year, month);

    let mut records: Vec<RunRecord> = index
        .dates()
        .flat_map(|date| index.records_on(date).iter().map(|record| (*record).clone()))
        .collect();
    records.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
    Ok(Json(records))
}

pub async fn create_record(
    State(state): State<AppState>,
    Json(payload): Json<RecordRequest>,
) -> Result<(StatusCode, Json<RunRecord>), AppError> {
    let date = validate_record(&payload)?;
    let record = RunRecord {
        id: Uuid::new_v4().to_string(),
        date: date_key(date),
        distance: payload.distance,
    };

    let mut data = state.data.lock().await;
    let mut next = data.clone();
    next.records.push(record.clone());
    persist_data(&state.data_path, &next).await?;
    *data = next;
    drop(data);

    info!(id = %record.id, date = %record.date, distance = record.distance, "run recorded");
    state.events.publish(LogEvent::RecordSaved {
        id: record.id.clone(),
        date: record.date.clone(),
    });
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RecordRequest>,
) -> Result<Json<RunRecord>, AppError> {
    let date = validate_record(&payload)?;

    let mut data = state.data.lock().await;
    let mut next = data.clone();
    let record = next
        .records
        .iter_mut()
        .find(|record| record.id == id)
        .ok_or_else(|| AppError::not_found(format!("no record with id {id}")))?;
    record.date = date_key(date);
    record.distance = payload.distance;
    let updated = record.clone();
    persist_data(&state.data_path, &next).await?;
    *data = next;
    drop(data);

    info!(id = %updated.id, date = %updated.date, distance = updated.distance, "run updated");
    state.events.publish(LogEvent::RecordSaved {
        id: updated.id.clone(),
        date: updated.date.clone(),
    });
    Ok(Json(updated))
}

pub async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let mut data = state.data.lock().await;
    let mut next = data.clone();
    let position = next
        .records
        .iter()
        .position(|record| record.id == id)
        .ok_or_else(|| AppError::not_found(format!("no record with id {id}")))?;
    let removed = next.records.remove(position);
    persist_data(&state.data_path, &next).await?;
    *data = next;
    drop(data);

    info!(id = %removed.id, date = %removed.date, "run deleted");
    state.events.publish(LogEvent::RecordDeleted {
        id: removed.id,
        date: removed.date,
    });
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_monthly_goals(State(state): State<AppState>) -> Json<Vec<MonthlyGoal>> {
    let data = state.data.lock().await;
    let mut goals = data.monthly_goals.clone();
    goals.sort_by_key(|goal| (goal.year, goal.month));
    Json(goals)
}

pub async fn set_monthly_goal(
    State(state): State<AppState>,
    Json(payload): Json<MonthlyGoalRequest>,
) -> Result<Json<MonthlyGoal>, AppError> {
    if !(1..=12).contains(&payload.month) {
        return Err(AppError::bad_request("month must be between 1 and 12"));
    }
    validate_goal(payload.distance_goal)?;

    let goal = MonthlyGoal {
        year: payload.year,
        month: payload.month,
        distance_goal: payload.distance_goal,
    };
    let mut data = state.data.lock().await;
    let mut next = data.clone();
    match next
        .monthly_goals
        .iter()
        .position(|existing| existing.year == goal.year && existing.month == goal.month)
    {
        Some(i) => next.monthly_goals[i].distance_goal = goal.distance_goal,
        None => next.monthly_goals.push(goal.clone()),
    }
    persist_data(&state.data_path, &next).await?;
    *data = next;
    drop(data);

    info!(year = goal.year, month = goal.month, goal = ?goal.distance_goal, "monthly goal set");
    state.events.publish(LogEvent::MonthlyGoalSet {
        year: goal.year,
        month: goal.month,
    });
    Ok(Json(goal))
}

pub async fn list_yearly_goals(State(state): State<AppState>) -> Json<Vec<YearlyGoal>> {
    let data = state.data.lock().await;
    let mut goals = data.yearly_goals.clone();
    goals.sort_by_key(|goal| goal.year);
    Json(goals)
}

pub async fn set_yearly_goal(
    State(state): State<AppState>,
    Json(payload): Json<YearlyGoalRequest>,
) -> Result<Json<YearlyGoal>, AppError> {
    validate_goal(payload.distance_goal)?;

    let goal = YearlyGoal {
        year: payload.year,
        distance_goal: payload.distance_goal,
    };
    let mut data = state.data.lock().await;
    let mut next = data.clone();
    match next
        .yearly_goals
        .iter()
        .position(|existing| existing.year == goal.year)
    {
        Some(i) => next.yearly_goals[i].distance_goal = goal.distance_goal,
        None => next.yearly_goals.push(goal.clone()),
    }
    persist_data(&state.data_path, &next).await?;
    *data = next;
    drop(data);

    info!(year = goal.year, goal = ?goal.distance_goal, "yearly goal set");
    state.events.publish(LogEvent::YearlyGoalSet { year: goal.year });
    Ok(Json(goal))
}

pub async fn current_goals(State(state): State<AppState>) -> Json<CurrentGoalsResponse> {
    let today = today();
    let (year, month) = (today.year(), today.month());
    let data = state.data.lock().await;

    let monthly = resolve_monthly_goal(&data.monthly_goals, year, month).map(|km| MonthlyGoal {
        year,
        month,
        distance_goal: Some(km),
    });
    let yearly = resolve_yearly_goal(&data.yearly_goals, year).map(|km| YearlyGoal {
        year,
        distance_goal: Some(km),
    });
    Json(CurrentGoalsResponse { monthly, yearly })
}

pub async fn get_progress(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthlyProgress>, AppError> {
    let today = today();
    let (year, month) = resolve_month(&query, today)?;
    let data = state.data.lock().await;
    Ok(Json(aggregate_month(
        &data.records,
        &data.monthly_goals,
        year,
        month,
        today,
    )))
}

pub async fn get_calendar(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthCalendar>, AppError> {
    let today = today();
    let (year, month) = resolve_month(&query, today)?;
    let data = state.data.lock().await;
    Ok(Json(build_month_calendar(&data.records, year, month, today)))
}

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, AppError> {
    let data = state.data.lock().await;
    Ok(Json(build_stats(&data)))
}

pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    Sse::new(event_stream(state.events.subscribe(), state.shutdown_rx())).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    )
}

/// SSE frames for each published event. Ends when the server shuts down so
/// graceful shutdown is not held open by connected pages.
pub fn event_stream(
    mut receiver: broadcast::Receiver<LogEvent>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        loop {
            let received = tokio::select! {
                biased;
                received = receiver.recv() => received,
                _ = shutdown_rx.recv() => break,
            };
            match received {
                Ok(event) => {
                    if let Ok(json) = serde_json::to_string(&event) {
                        yield Ok(Event::default().event(event.name()).data(json));
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event subscriber lagged, asking client to reload");
                    yield Ok(Event::default().event("resync").data("{}"));
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

fn validate_record(payload: &RecordRequest) -> Result<NaiveDate, AppError> {
    let date = parse_date_key(&payload.date)
        .ok_or_else(|| AppError::bad_request("date must be a valid YYYY-MM-DD date"))?;
    if !payload.distance.is_finite() || payload.distance < 0.0 {
        return Err(AppError::bad_request("distance must be a non-negative number"));
    }
    Ok(date)
}

fn validate_goal(distance_goal: Option<f64>) -> Result<(), AppError> {
    match distance_goal {
        Some(km) if !km.is_finite() || km <= 0.0 => Err(AppError::bad_request(
            "distance_goal must be a positive number or null",
        )),
        _ => Ok(()),
    }
}

fn resolve_month(query: &MonthQuery, today: NaiveDate) -> Result<(i32, u32), AppError> {
    let year = query.year.unwrap_or(today.year());
    let month = query.month.unwrap_or(today.month());
    if !(1..=12).contains(&month) {
        return Err(AppError::bad_request("month must be between 1 and 12"));
    }
    Ok((year, month))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::AppData;
    use crate::storage::load_data;
    use futures::StreamExt;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "running_log_handlers_{name}_{}_{nanos}",
            std::process::id()
        ))
    }

    fn state_at(data_path: PathBuf, data: AppData) -> AppState {
        let config = AppConfig {
            data_path,
            ..AppConfig::default()
        };
        AppState::new(&config, data)
    }

    // The directory is never created, so every write fails.
    fn unwritable_state(data: AppData) -> AppState {
        state_at(scratch_dir("missing").join("state.json"), data)
    }

    fn run_request(date: &str, distance: f64) -> Json<RecordRequest> {
        Json(RecordRequest {
            date: date.to_string(),
            distance,
        })
    }

    fn seeded() -> AppData {
        AppData {
            records: vec![RunRecord {
                id: "r1".into(),
                date: "2025-06-01".into(),
                distance: 5.0,
            }],
            ..AppData::default()
        }
    }

    #[tokio::test]
    async fn failed_create_leaves_memory_untouched() {
        let state = unwritable_state(AppData::default());
        let mut receiver = state.events.subscribe();

        let err = create_record(State(state.clone()), run_request("2025-06-02", 4.0))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(state.data.lock().await.records.is_empty());
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn failed_writes_roll_back_records_and_goals() {
        let state = unwritable_state(seeded());

        assert!(
            update_record(
                State(state.clone()),
                Path("r1".to_string()),
                run_request("2025-06-09", 12.0),
            )
            .await
            .is_err()
        );
        assert!(delete_record(State(state.clone()), Path("r1".to_string())).await.is_err());
        assert!(
            set_monthly_goal(
                State(state.clone()),
                Json(MonthlyGoalRequest {
                    year: 2025,
                    month: 6,
                    distance_goal: Some(90.0),
                }),
            )
            .await
            .is_err()
        );
        assert!(
            set_yearly_goal(
                State(state.clone()),
                Json(YearlyGoalRequest {
                    year: 2025,
                    distance_goal: Some(1000.0),
                }),
            )
            .await
            .is_err()
        );

        let data = state.data.lock().await;
        assert_eq!(data.records, seeded().records);
        assert!(data.monthly_goals.is_empty());
        assert!(data.yearly_goals.is_empty());
    }

    #[tokio::test]
    async fn successful_writes_persist_and_publish() {
        let dir = scratch_dir("ok");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("state.json");
        let state = state_at(path.clone(), AppData::default());
        let mut receiver = state.events.subscribe();

        let (status, Json(record)) =
            create_record(State(state.clone()), run_request("2025-06-02", 4.0))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            receiver.recv().await.unwrap(),
            LogEvent::RecordSaved {
                id: record.id.clone(),
                date: "2025-06-02".into(),
            }
        );

        set_monthly_goal(
            State(state.clone()),
            Json(MonthlyGoalRequest {
                year: 2025,
                month: 6,
                distance_goal: Some(90.0),
            }),
        )
        .await
        .unwrap();
        assert_eq!(
            receiver.recv().await.unwrap(),
            LogEvent::MonthlyGoalSet { year: 2025, month: 6 }
        );

        let stored = load_data(&path).await;
        assert_eq!(stored.records, vec![record.clone()]);
        assert_eq!(stored.monthly_goals.len(), 1);

        let status = delete_record(State(state.clone()), Path(record.id.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(
            receiver.recv().await.unwrap(),
            LogEvent::RecordDeleted {
                id: record.id,
                date: "2025-06-02".into(),
            }
        );
        assert!(load_data(&path).await.records.is_empty());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn event_stream_ends_on_shutdown() {
        let state = state_at(scratch_dir("stream").join("state.json"), AppData::default());
        let stream = event_stream(state.events.subscribe(), state.shutdown_rx());

        state.events.publish(LogEvent::YearlyGoalSet { year: 2025 });
        assert_eq!(state.shutdown(), 1);

        let frames: Vec<_> = stream.collect().await;
        assert_eq!(frames.len(), 1);
    }
}

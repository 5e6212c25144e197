use serde::{Deserialize, Deserializer, Serialize};

/// One logged run. `date` is a canonical `YYYY-MM-DD` key, kept as text so a
/// damaged store entry can still be loaded and skipped later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: String,
    pub date: String,
    #[serde(default = "missing_distance", deserialize_with = "lenient_distance")]
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyGoal {
    pub year: i32,
    pub month: u32,
    #[serde(default)]
    pub distance_goal: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyGoal {
    pub year: i32,
    #[serde(default)]
    pub distance_goal: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub records: Vec<RunRecord>,
    #[serde(default)]
    pub monthly_goals: Vec<MonthlyGoal>,
    #[serde(default)]
    pub yearly_goals: Vec<YearlyGoal>,
}

#[derive(Debug, Deserialize)]
pub struct RecordRequest {
    pub date: String,
    pub distance: f64,
}

#[derive(Debug, Deserialize)]
pub struct MonthlyGoalRequest {
    pub year: i32,
    pub month: u32,
    pub distance_goal: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct YearlyGoalRequest {
    pub year: i32,
    pub distance_goal: Option<f64>,
}

/// Optional `?year=&month=` selector; missing parts default to today.
#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentGoalsResponse {
    pub monthly: Option<MonthlyGoal>,
    pub yearly: Option<YearlyGoal>,
}

#[derive(Debug, Serialize)]
pub struct DailyPoint {
    pub date: String,
    pub distance: f64,
    pub runs: usize,
}

#[derive(Debug, Serialize)]
pub struct WeeklyPoint {
    pub week: String,
    pub start_date: String,
    pub end_date: String,
    pub distance: f64,
    pub runs: usize,
}

#[derive(Debug, Serialize)]
pub struct WeeklyAveragePoint {
    pub week: String,
    pub days_counted: u8,
    pub avg_distance: f64,
}

#[derive(Debug, Serialize)]
pub struct YearSummary {
    pub year: i32,
    pub total_distance: f64,
    pub runs: usize,
    pub distance_goal: Option<f64>,
    pub achievement_percent: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub last_7_days: Vec<DailyPoint>,
    pub weekly_totals: Vec<WeeklyPoint>,
    pub weekly_averages: Vec<WeeklyAveragePoint>,
    pub year: YearSummary,
}

fn missing_distance() -> f64 {
    f64::NAN
}

/// Accepts a number or a numeric string; anything else loads as NaN and is
/// ignored by aggregation instead of failing the whole store file.
fn lenient_distance<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(number) => number.as_f64().unwrap_or(f64::NAN),
        serde_json::Value::String(text) => text.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    })
}

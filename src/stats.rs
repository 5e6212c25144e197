use crate::date_key::date_key;
use crate::goals::resolve_yearly_goal;
use crate::models::{
    AppData, DailyPoint, StatsResponse, WeeklyAveragePoint, WeeklyPoint, YearSummary,
};
use crate::records::RecordIndex;
use chrono::{Datelike, Duration, Local, NaiveDate};

pub fn build_stats(data: &AppData) -> StatsResponse {
    build_stats_at(Local::now().date_naive(), data)
}

pub fn build_stats_at(today: NaiveDate, data: &AppData) -> StatsResponse {
    const WEEK_COUNT: usize = 8;

    let index = RecordIndex::new(&data.records);

    let mut last_7_days = Vec::with_capacity(7);
    for offset in (0..7).rev() {
        let date = today - Duration::days(offset as i64);
        last_7_days.push(DailyPoint {
            date: date_key(date),
            distance: index.day_total(date),
            runs: index.run_count_on(date),
        });
    }

    let current_week_start = week_start(today);
    let mut weekly_totals = Vec::with_capacity(WEEK_COUNT);
    let mut weekly_averages = Vec::with_capacity(WEEK_COUNT);

    for offset in (0..WEEK_COUNT).rev() {
        let start = current_week_start - Duration::weeks(offset as i64);
        let end = start + Duration::days(6);

        let distance = index.total_between(start, end);
        let days_counted = if today < start {
            0
        } else if today > end {
            7
        } else {
            (today - start).num_days() as u8 + 1
        };

        let denom = if days_counted == 0 { 1.0 } else { f64::from(days_counted) };

        weekly_totals.push(WeeklyPoint {
            week: week_label(start),
            start_date: date_key(start),
            end_date: date_key(end),
            distance,
            runs: index.runs_between(start, end),
        });

        weekly_averages.push(WeeklyAveragePoint {
            week: week_label(start),
            days_counted,
            avg_distance: distance / denom,
        });
    }

    StatsResponse {
        last_7_days,
        weekly_totals,
        weekly_averages,
        year: year_summary(today, &index, data),
    }
}

/// Year to date, measured against the whole-year goal.
fn year_summary(today: NaiveDate, index: &RecordIndex<'_>, data: &AppData) -> YearSummary {
    let year = today.year();
    let (total_distance, runs) = match NaiveDate::from_ymd_opt(year, 1, 1) {
        Some(start) => (index.total_between(start, today), index.runs_between(start, today)),
        None => (0.0, 0),
    };
    let distance_goal = resolve_yearly_goal(&data.yearly_goals, year);

    YearSummary {
        year,
        total_distance,
        runs,
        distance_goal,
        achievement_percent: distance_goal.map(|goal| total_distance / goal * 100.0),
    }
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RunRecord, YearlyGoal};

    fn run(date: NaiveDate, distance: f64) -> RunRecord {
        RunRecord {
            id: format!("{date}-{distance}"),
            date: date_key(date),
            distance,
        }
    }

    #[test]
    fn stats_last_7_days_includes_each_day() {
        let mut data = AppData::default();
        let today = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let two_days_ago = today - Duration::days(2);
        data.records.push(run(two_days_ago, 6.0));
        data.records.push(run(two_days_ago, 4.5));

        let stats = build_stats_at(today, &data);
        assert_eq!(stats.last_7_days.len(), 7);
        let point = stats
            .last_7_days
            .iter()
            .find(|day| day.date == date_key(two_days_ago))
            .expect("missing day");
        assert_eq!(point.distance, 10.5);
        assert_eq!(point.runs, 2);
    }

    #[test]
    fn stats_weekly_series_lengths() {
        let data = AppData::default();
        let today = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let stats = build_stats_at(today, &data);
        assert_eq!(stats.weekly_totals.len(), 8);
        assert_eq!(stats.weekly_averages.len(), 8);
        assert_eq!(stats.last_7_days.len(), 7);
    }

    #[test]
    fn current_week_average_uses_days_so_far() {
        let mut data = AppData::default();
        // Wednesday: three days into the ISO week.
        let today = NaiveDate::from_ymd_opt(2025, 6, 4).unwrap();
        data.records.push(run(today, 9.0));

        let stats = build_stats_at(today, &data);
        let current = stats.weekly_averages.last().unwrap();
        assert_eq!(current.days_counted, 3);
        assert_eq!(current.avg_distance, 3.0);
        assert_eq!(stats.weekly_totals.last().unwrap().start_date, "2025-06-02");
    }

    #[test]
    fn year_summary_against_goal() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let mut data = AppData::default();
        data.records.push(run(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(), 50.0));
        data.records.push(run(NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(), 100.0));
        data.records.push(run(NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(), 30.0));

        let stats = build_stats_at(today, &data);
        assert_eq!(stats.year.total_distance, 100.0);
        assert_eq!(stats.year.runs, 1);
        assert_eq!(stats.year.achievement_percent, None);

        data.yearly_goals.push(YearlyGoal {
            year: 2025,
            distance_goal: Some(1000.0),
        });
        let stats = build_stats_at(today, &data);
        assert_eq!(stats.year.distance_goal, Some(1000.0));
        assert_eq!(stats.year.achievement_percent, Some(10.0));
    }
}

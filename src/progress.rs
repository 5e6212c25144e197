//! Monthly progress series for the calendar and the cumulative chart.
//!
//! [`aggregate_month`] is pure: it takes already-loaded records and goals and
//! an injected `today`, and never fails. Bad entries are dropped, an unknown
//! goal stays unknown, and an invalid month produces an empty result.

use crate::date_key::{date_key, days_in_month, month_start};
use crate::goals::resolve_monthly_goal;
use crate::models::{MonthlyGoal, RunRecord};
use crate::records::RecordIndex;
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

/// Per-day series for one calendar month. All three sequences have one
/// entry per day, day 1 first. `None` means "not known": a future day in
/// `cumulative_distances`, or a month without a goal for the pace line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyProgress {
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    /// Last day with known data: today in the current month, the month's
    /// last day for past months, and 0 for months that have not started.
    pub cutoff_day: u32,
    pub daily_distances: Vec<f64>,
    pub cumulative_distances: Vec<Option<f64>>,
    pub cumulative_goal_pace: Option<Vec<f64>>,
    pub month_total_distance: f64,
    pub goal_for_month: Option<f64>,
    /// Month total as a percentage of the whole-month goal.
    pub achievement_percent: Option<f64>,
}

/// One day of a [`MonthlyProgress`], for consumers that prefer rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBucket {
    pub date: String,
    pub day_distance: f64,
    pub cumulative_distance: Option<f64>,
    pub cumulative_goal_pace: Option<f64>,
}

pub fn aggregate_month(
    records: &[RunRecord],
    goals: &[MonthlyGoal],
    year: i32,
    month: u32,
    today: NaiveDate,
) -> MonthlyProgress {
    let (Some(first_day), Some(total_days)) = (month_start(year, month), days_in_month(year, month))
    else {
        return MonthlyProgress::empty(year, month);
    };

    let cutoff = cutoff_day(year, month, total_days, today);
    let index = RecordIndex::for_month(records, year, month);

    let daily_distances: Vec<f64> = (0..total_days)
        .map(|offset| index.day_total(first_day + Duration::days(i64::from(offset))))
        .collect();

    let mut running = 0.0;
    let cumulative_distances: Vec<Option<f64>> = daily_distances
        .iter()
        .zip(1..=total_days)
        .map(|(distance, day)| {
            if day <= cutoff {
                running += distance;
                Some(running)
            } else {
                None
            }
        })
        .collect();

    let goal_for_month = resolve_monthly_goal(goals, year, month);
    let cumulative_goal_pace = goal_for_month.map(|goal| goal_pace(goal, total_days));

    let month_total_distance = running;
    let achievement_percent = goal_for_month.map(|goal| month_total_distance / goal * 100.0);

    MonthlyProgress {
        year,
        month,
        days_in_month: total_days,
        cutoff_day: cutoff,
        daily_distances,
        cumulative_distances,
        cumulative_goal_pace,
        month_total_distance,
        goal_for_month,
        achievement_percent,
    }
}

fn cutoff_day(year: i32, month: u32, total_days: u32, today: NaiveDate) -> u32 {
    match (year, month).cmp(&(today.year(), today.month())) {
        std::cmp::Ordering::Less => total_days,
        std::cmp::Ordering::Equal => today.day().min(total_days),
        std::cmp::Ordering::Greater => 0,
    }
}

/// Linear pro-ration of `goal` over every day of the month; the last entry is
/// the goal itself.
fn goal_pace(goal: f64, total_days: u32) -> Vec<f64> {
    let total = f64::from(total_days);
    (1..=total_days)
        .map(|day| goal * f64::from(day) / total)
        .collect()
}

impl MonthlyProgress {
    fn empty(year: i32, month: u32) -> Self {
        Self {
            year,
            month,
            days_in_month: 0,
            cutoff_day: 0,
            daily_distances: Vec::new(),
            cumulative_distances: Vec::new(),
            cumulative_goal_pace: None,
            month_total_distance: 0.0,
            goal_for_month: None,
            achievement_percent: None,
        }
    }

    pub fn buckets(&self) -> Vec<DailyBucket> {
        let Some(first_day) = month_start(self.year, self.month) else {
            return Vec::new();
        };
        self.daily_distances
            .iter()
            .enumerate()
            .map(|(i, distance)| DailyBucket {
                date: date_key(first_day + Duration::days(i as i64)),
                day_distance: *distance,
                cumulative_distance: self.cumulative_distances[i],
                cumulative_goal_pace: self.cumulative_goal_pace.as_ref().map(|pace| pace[i]),
            })
            .collect()
    }

    /// Where the pace line stands on the cutoff day. `None` without a goal or
    /// before the month has started.
    pub fn pace_at_cutoff(&self) -> Option<f64> {
        let pace = self.cumulative_goal_pace.as_ref()?;
        let index = (self.cutoff_day as usize).checked_sub(1)?;
        pace.get(index).copied()
    }

    /// Distance ahead of (positive) or behind (negative) the pace line at the
    /// cutoff day.
    pub fn pace_difference(&self) -> Option<f64> {
        self.pace_at_cutoff()
            .map(|pace| self.month_total_distance - pace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(date: &str, distance: f64) -> RunRecord {
        RunRecord {
            id: format!("{date}-{distance}"),
            date: date.to_string(),
            distance,
        }
    }

    fn goal(year: i32, month: u32, km: f64) -> MonthlyGoal {
        MonthlyGoal {
            year,
            month,
            distance_goal: Some(km),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn june_scenario_mid_month() {
        let records = vec![run("2025-06-01", 5.0), run("2025-06-02", 3.0)];
        let goals = vec![goal(2025, 6, 90.0)];
        let progress = aggregate_month(&records, &goals, 2025, 6, day(2025, 6, 2));

        assert_eq!(progress.days_in_month, 30);
        assert_eq!(progress.cutoff_day, 2);
        assert_eq!(progress.cumulative_distances.len(), 30);
        assert_eq!(progress.cumulative_distances[0], Some(5.0));
        assert_eq!(progress.cumulative_distances[1], Some(8.0));
        assert!(progress.cumulative_distances[2..].iter().all(Option::is_none));
        assert_eq!(progress.month_total_distance, 8.0);
        assert_eq!(progress.goal_for_month, Some(90.0));

        let pace = progress.cumulative_goal_pace.as_ref().unwrap();
        assert_eq!(pace.len(), 30);
        assert!((pace[1] - 6.0).abs() < 1e-9);
        assert!((pace[29] - 90.0).abs() < 1e-9);

        let percent = progress.achievement_percent.unwrap();
        assert!((percent - 8.0 / 90.0 * 100.0).abs() < 1e-9);
        assert!((progress.pace_difference().unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn past_month_is_fully_known() {
        let records = vec![run("2024-02-29", 10.0)];
        let progress = aggregate_month(&records, &[], 2024, 2, day(2025, 1, 15));
        assert_eq!(progress.days_in_month, 29);
        assert_eq!(progress.cutoff_day, 29);
        assert_eq!(progress.cumulative_distances[28], Some(10.0));
        assert!(progress.cumulative_distances.iter().all(Option::is_some));
    }

    #[test]
    fn future_month_has_no_known_days() {
        let records = vec![run("2025-07-01", 10.0)];
        let goals = vec![goal(2025, 7, 62.0)];
        let progress = aggregate_month(&records, &goals, 2025, 7, day(2025, 6, 20));
        assert_eq!(progress.cutoff_day, 0);
        assert!(progress.cumulative_distances.iter().all(Option::is_none));
        assert_eq!(progress.month_total_distance, 0.0);
        assert_eq!(progress.daily_distances[0], 10.0);
        assert_eq!(progress.cumulative_goal_pace.as_ref().map(Vec::len), Some(31));
        assert_eq!(progress.pace_at_cutoff(), None);
        assert_eq!(progress.pace_difference(), None);
    }

    #[test]
    fn missing_goal_stays_unknown() {
        let records = vec![run("2025-06-01", 5.0)];
        let goals = vec![goal(2025, 5, 100.0)];
        let progress = aggregate_month(&records, &goals, 2025, 6, day(2025, 6, 30));
        assert_eq!(progress.goal_for_month, None);
        assert_eq!(progress.cumulative_goal_pace, None);
        assert_eq!(progress.achievement_percent, None);
        assert_eq!(progress.pace_difference(), None);
    }

    #[test]
    fn empty_records_give_zero_through_cutoff() {
        let progress = aggregate_month(&[], &[], 2023, 2, day(2023, 2, 10));
        assert_eq!(progress.days_in_month, 28);
        assert!(progress.daily_distances.iter().all(|d| *d == 0.0));
        assert!(progress.cumulative_distances[..10].iter().all(|d| *d == Some(0.0)));
        assert!(progress.cumulative_distances[10..].iter().all(Option::is_none));
    }

    #[test]
    fn invalid_month_degrades_to_empty() {
        let progress = aggregate_month(&[run("2025-06-01", 5.0)], &[], 2025, 13, day(2025, 6, 1));
        assert_eq!(progress.days_in_month, 0);
        assert!(progress.daily_distances.is_empty());
        assert!(progress.buckets().is_empty());
    }

    #[test]
    fn bad_entries_do_not_break_the_month() {
        let records = vec![
            run("2025-06-03", 3.0),
            run("2025-06-03", 2.5),
            run("2025-06-03", -4.0),
            run("2025-06-xx", 9.0),
            run("2025-06-04", f64::NAN),
        ];
        let progress = aggregate_month(&records, &[], 2025, 6, day(2025, 6, 30));
        assert_eq!(progress.daily_distances[2], 5.5);
        assert_eq!(progress.daily_distances[3], 0.0);
        assert_eq!(progress.month_total_distance, 5.5);
    }

    #[test]
    fn buckets_mirror_series() {
        let records = vec![run("2025-06-01", 5.0)];
        let goals = vec![goal(2025, 6, 30.0)];
        let progress = aggregate_month(&records, &goals, 2025, 6, day(2025, 6, 1));
        let buckets = progress.buckets();
        assert_eq!(buckets.len(), 30);
        assert_eq!(buckets[0].date, "2025-06-01");
        assert_eq!(buckets[0].day_distance, 5.0);
        assert_eq!(buckets[0].cumulative_distance, Some(5.0));
        assert_eq!(buckets[0].cumulative_goal_pace, Some(1.0));
        assert_eq!(buckets[29].date, "2025-06-30");
        assert_eq!(buckets[29].cumulative_distance, None);
    }
}

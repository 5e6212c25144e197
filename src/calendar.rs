use crate::date_key::{date_key, days_in_month, month_start, shift_month};
use crate::models::RunRecord;
use crate::records::RecordIndex;
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthRef {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    pub date: String,
    pub day: u32,
    /// `None` on days without a run, so the grid can leave them blank.
    pub distance: Option<f64>,
    pub runs: usize,
    pub is_today: bool,
    pub is_future: bool,
}

/// Month grid, Monday first. Every week has seven slots; slots outside the
/// month are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthCalendar {
    pub year: i32,
    pub month: u32,
    pub title: String,
    pub weeks: Vec<Vec<Option<CalendarDay>>>,
    pub previous: Option<MonthRef>,
    pub next: Option<MonthRef>,
}

pub fn month_title(year: i32, month: u32) -> String {
    match month.checked_sub(1).and_then(|i| MONTH_NAMES.get(i as usize)) {
        Some(name) => format!("{name} {year}"),
        None => format!("{year}-{month:02}"),
    }
}

pub fn build_month_calendar(
    records: &[RunRecord],
    year: i32,
    month: u32,
    today: NaiveDate,
) -> MonthCalendar {
    let neighbour = |delta| shift_month(year, month, delta).map(|(year, month)| MonthRef { year, month });
    let mut calendar = MonthCalendar {
        year,
        month,
        title: month_title(year, month),
        weeks: Vec::new(),
        previous: neighbour(-1),
        next: neighbour(1),
    };

    let (Some(first_day), Some(total_days)) = (month_start(year, month), days_in_month(year, month))
    else {
        return calendar;
    };
    let index = RecordIndex::for_month(records, year, month);

    let leading = first_day.weekday().num_days_from_monday() as usize;
    let mut slots: Vec<Option<CalendarDay>> = vec![None; leading];
    for offset in 0..total_days {
        let date = first_day + Duration::days(i64::from(offset));
        let runs = index.run_count_on(date);
        slots.push(Some(CalendarDay {
            date: date_key(date),
            day: date.day(),
            distance: (runs > 0).then(|| index.day_total(date)),
            runs,
            is_today: date == today,
            is_future: date > today,
        }));
    }
    while slots.len() % 7 != 0 {
        slots.push(None);
    }

    calendar.weeks = slots.chunks(7).map(|week| week.to_vec()).collect();
    calendar
}

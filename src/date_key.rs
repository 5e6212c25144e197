//! Canonical `YYYY-MM-DD` date keys and month arithmetic.
//!
//! Keys are always built from a date's own calendar components, never from
//! an instant converted to UTC, so a run logged late in the evening stays on
//! the day it was logged.

use chrono::{Datelike, NaiveDate};

const KEY_FORMAT: &str = "%Y-%m-%d";

pub fn date_key(date: NaiveDate) -> String {
    date.format(KEY_FORMAT).to_string()
}

/// Parses a canonical key. Returns `None` for anything that is not a real
/// calendar date written as `YYYY-MM-DD` with zero-padded month and day.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    let key = key.trim();
    let canonical = key.len() == 10
        && key.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !canonical {
        return None;
    }
    NaiveDate::parse_from_str(key, KEY_FORMAT).ok()
}

/// Splits a key into `(year, month, day)` with a 1-indexed month.
pub fn key_components(key: &str) -> Option<(i32, u32, u32)> {
    parse_date_key(key).map(|date| (date.year(), date.month(), date.day()))
}

pub fn month_start(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

pub fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = shift_month(year, month, 1)?;
    month_start(next_year, next_month)?.pred_opt()
}

/// Number of calendar days in the month, honouring the leap-year rule.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    month_end(year, month).map(|date| date.day())
}

/// Moves `delta` months forward (or backward when negative).
pub fn shift_month(year: i32, month: u32, delta: i32) -> Option<(i32, u32)> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let index = i64::from(year) * 12 + i64::from(month) - 1 + i64::from(delta);
    let shifted_year = i32::try_from(index.div_euclid(12)).ok()?;
    let shifted_month = index.rem_euclid(12) as u32 + 1;
    Some((shifted_year, shifted_month))
}

pub fn same_month(date: NaiveDate, year: i32, month: u32) -> bool {
    date.year() == year && date.month() == month
}

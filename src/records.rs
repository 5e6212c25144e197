//! Groups run records by calendar day.

use crate::date_key::{month_end, month_start, parse_date_key};
use crate::models::RunRecord;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

/// Distance a record contributes to a sum. Negative, NaN and infinite values
/// count as zero.
pub fn effective_distance(record: &RunRecord) -> f64 {
    if record.distance.is_finite() && record.distance > 0.0 {
        record.distance
    } else {
        0.0
    }
}

/// Records keyed by their parsed date. Entries whose date does not parse are
/// left out; building an index never fails.
#[derive(Debug, Default)]
pub struct RecordIndex<'a> {
    days: BTreeMap<NaiveDate, Vec<&'a RunRecord>>,
}

impl<'a> RecordIndex<'a> {
    pub fn new(records: &'a [RunRecord]) -> Self {
        Self::build(records, |_| true)
    }

    /// Keeps records dated within `start..=end`.
    pub fn for_range(records: &'a [RunRecord], start: NaiveDate, end: NaiveDate) -> Self {
        Self::build(records, |date| start <= date && date <= end)
    }

    /// Keeps records of one calendar month; an invalid month yields an empty index.
    pub fn for_month(records: &'a [RunRecord], year: i32, month: u32) -> Self {
        match (month_start(year, month), month_end(year, month)) {
            (Some(start), Some(end)) => Self::for_range(records, start, end),
            _ => Self::default(),
        }
    }

    fn build(records: &'a [RunRecord], keep: impl Fn(NaiveDate) -> bool) -> Self {
        let mut days: BTreeMap<NaiveDate, Vec<&'a RunRecord>> = BTreeMap::new();
        for record in records {
            let Some(date) = parse_date_key(&record.date) else {
                debug!(id = %record.id, date = %record.date, "skipping record with malformed date");
                continue;
            };
            if keep(date) {
                days.entry(date).or_default().push(record);
            }
        }
        Self { days }
    }

    pub fn records_on(&self, date: NaiveDate) -> &[&'a RunRecord] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn run_count_on(&self, date: NaiveDate) -> usize {
        self.records_on(date).len()
    }

    /// Summed distance on `date`, zero when nothing was logged.
    pub fn day_total(&self, date: NaiveDate) -> f64 {
        sum_sorted(self.records_on(date).iter().map(|record| effective_distance(record)))
    }

    pub fn total_between(&self, start: NaiveDate, end: NaiveDate) -> f64 {
        if start > end {
            return 0.0;
        }
        self.days
            .range(start..=end)
            .map(|(date, _)| self.day_total(*date))
            .sum()
    }

    pub fn runs_between(&self, start: NaiveDate, end: NaiveDate) -> usize {
        if start > end {
            return 0;
        }
        self.days.range(start..=end).map(|(_, runs)| runs.len()).sum()
    }

    pub fn total(&self) -> f64 {
        self.days.keys().map(|date| self.day_total(*date)).sum()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

// Summing in sorted order keeps the result independent of record order.
fn sum_sorted(values: impl Iterator<Item = f64>) -> f64 {
    let mut values: Vec<f64> = values.collect();
    values.sort_by(f64::total_cmp);
    values.into_iter().sum()
}

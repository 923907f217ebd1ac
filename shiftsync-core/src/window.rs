//! Months, month ranges and sync windows.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::shift::ShiftRecord;

/// Longest range a single command may fetch.
pub const MAX_MONTHS: usize = 12;

/// A calendar month, the unit the shift site publishes schedules in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(YearMonth { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parse `YYYY-MM`.
    pub fn parse(s: &str) -> CoreResult<Self> {
        NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
            .map(Self::of)
            .map_err(|_| CoreError::InvalidMonth(s.to_string()))
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn add_months(self, n: u32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + n as i32;
        YearMonth {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn next(self) -> Self {
        self.add_months(1)
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("YearMonth always holds a valid month")
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// An inclusive, non-empty run of months to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthRange {
    months: Vec<YearMonth>,
}

impl MonthRange {
    /// Resolve `--from`/`--to` arguments.
    ///
    /// - neither: the current month and the next one
    /// - only `from`: `from` and the month after it
    /// - only `to`: the current month through `to`
    /// - both: the inclusive range
    pub fn resolve(from: Option<&str>, to: Option<&str>, today: NaiveDate) -> CoreResult<Self> {
        resolve_months(from, to, today).map(|months| MonthRange { months })
    }

    pub fn months(&self) -> &[YearMonth] {
        &self.months
    }

    pub fn first(&self) -> YearMonth {
        self.months[0]
    }

    pub fn last(&self) -> YearMonth {
        self.months[self.months.len() - 1]
    }
}

impl fmt::Display for MonthRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first() == self.last() {
            write!(f, "{}", self.first())
        } else {
            write!(f, "{} to {}", self.first(), self.last())
        }
    }
}

fn resolve_months(from: Option<&str>, to: Option<&str>, today: NaiveDate) -> CoreResult<Vec<YearMonth>> {
    let current = YearMonth::of(today);

    let (first, last) = match (from, to) {
        (None, None) => (current, current.next()),
        (Some(from), None) => {
            let from = YearMonth::parse(from)?;
            (from, from.next())
        }
        (None, Some(to)) => (current, YearMonth::parse(to)?),
        (Some(from), Some(to)) => (YearMonth::parse(from)?, YearMonth::parse(to)?),
    };

    if first > last {
        return Err(CoreError::InvalidRange(format!("{first} is after {last}")));
    }

    let mut months = vec![first];
    while let Some(&month) = months.last().filter(|m| **m < last) {
        if months.len() == MAX_MONTHS {
            return Err(CoreError::InvalidRange(format!(
                "{first}..{last} spans more than {MAX_MONTHS} months"
            )));
        }
        months.push(month.next());
    }

    Ok(months)
}

/// Half-open time range `[start, end)` a reconciliation run is scoped to.
///
/// A managed event belongs to the window when its start lies inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SyncWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        SyncWindow { start, end }
    }

    /// From local midnight on the first day of `first` to local midnight on
    /// the first day of the month after `last`.
    pub fn for_months(first: YearMonth, last: YearMonth, tz: Tz) -> Self {
        SyncWindow {
            start: local_midnight(first.first_day(), tz),
            end: local_midnight(last.next().first_day(), tz),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

impl fmt::Display for SyncWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// Shifts for one contiguous run of successfully fetched months.
#[derive(Debug, Clone)]
pub struct WindowBatch {
    pub months: Vec<YearMonth>,
    pub window: SyncWindow,
    pub shifts: Vec<ShiftRecord>,
}

/// Group per-month fetch outcomes into windows that can be reconciled.
///
/// A month whose fetch failed (`None`) splits the runs around it and is never
/// part of any window, so its calendar events are left untouched.
pub fn group_contiguous(
    fetched: impl IntoIterator<Item = (YearMonth, Option<Vec<ShiftRecord>>)>,
    tz: Tz,
) -> Vec<WindowBatch> {
    let mut fetched: Vec<_> = fetched.into_iter().collect();
    fetched.sort_by_key(|(month, _)| *month);

    let mut batches: Vec<WindowBatch> = Vec::new();
    let mut previous: Option<YearMonth> = None;

    for (month, shifts) in fetched {
        let Some(shifts) = shifts else {
            previous = None;
            continue;
        };

        match batches.last_mut() {
            Some(batch) if previous.map(YearMonth::next) == Some(month) => {
                batch.months.push(month);
                batch.window.end = SyncWindow::for_months(month, month, tz).end;
                batch.shifts.extend(shifts);
            }
            _ => batches.push(WindowBatch {
                months: vec![month],
                window: SyncWindow::for_months(month, month, tz),
                shifts,
            }),
        }
        previous = Some(month);
    }

    batches
}

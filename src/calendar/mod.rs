//! Date arithmetic behind the calendar views
//!
//! Everything here works on [`NaiveDate`]s, i.e. calendar dates with no time zone attached.
//! Dates coming from the server are built from their year, month and day components, so that no
//! time zone can ever shift them by a day.

pub mod grid;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{Datelike, Duration, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::AgendaError;

/// The layout the user is currently looking at
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Day,
    Week,
    Month,
    List,
}

impl Default for ViewMode {
    fn default() -> Self {
        ViewMode::Month
    }
}

impl Display for ViewMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewMode::Day => write!(f, "day"),
            ViewMode::Week => write!(f, "week"),
            ViewMode::Month => write!(f, "month"),
            ViewMode::List => write!(f, "list"),
        }
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(ViewMode::Day),
            "week" => Ok(ViewMode::Week),
            "month" => Ok(ViewMode::Month),
            "list" => Ok(ViewMode::List),
            other => Err(format!("unknown view mode {:?} (expected day, week, month or list)", other)),
        }
    }
}


/// An inclusive range of calendar dates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a range from its first and last days (both inclusive).
    /// Bounds given in the wrong order are swapped.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if end < start {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }

    pub fn single(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    pub fn start(&self) -> NaiveDate { self.start }
    pub fn end(&self) -> NaiveDate { self.end }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days in this range
    pub fn len(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    /// Iterate over every day of the range, in order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.len())
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", format_iso(self.start), format_iso(self.end))
    }
}


/// Parse an ISO `YYYY-MM-DD` string into a calendar date.
///
/// The date is assembled from its components; no instant is involved, so the result does not
/// depend on the host time zone.
pub fn parse_local_date(s: &str) -> Result<NaiveDate, AgendaError> {
    let invalid = || AgendaError::InvalidDate(s.to_string());

    let mut parts = s.split('-');
    let (year, month, day) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(y), Some(m), Some(d), None) => (y, m, d),
        _ => return Err(invalid()),
    };

    let year = digits(year, 4).ok_or_else(invalid)?;
    let month = digits(month, 2).ok_or_else(invalid)?;
    let day = digits(day, 2).ok_or_else(invalid)?;

    NaiveDate::from_ymd_opt(year as i32, month, day).ok_or_else(invalid)
}

fn digits(part: &str, len: usize) -> Option<u32> {
    if part.len() != len || part.bytes().any(|b| b.is_ascii_digit() == false) {
        return None;
    }
    part.parse().ok()
}

/// Format a date as ISO `YYYY-MM-DD`
pub fn format_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// The current date, in the local calendar of the host
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn is_today(date: NaiveDate, today: NaiveDate) -> bool {
    date == today
}

pub fn is_past(date: NaiveDate, today: NaiveDate) -> bool {
    date < today
}

/// Index of the weekday of `date`, with 0 for Sunday and 6 for Saturday
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days)).unwrap_or(date)
}

/// The most recent Sunday on or before `date`
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    add_days(date, -(weekday_index(date) as i64))
}

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    first_day_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Shift by whole calendar months.
/// The day of month is kept when it exists in the target month, otherwise it is clamped to the last day of that month.
pub fn shift_months(date: NaiveDate, months: i64) -> NaiveDate {
    let amount = match u32::try_from(months.unsigned_abs()) {
        Ok(amount) => Months::new(amount),
        Err(_) => return date,
    };
    let shifted = if months >= 0 {
        date.checked_add_months(amount)
    } else {
        date.checked_sub_months(amount)
    };
    shifted.unwrap_or(date)
}

/// The range of dates a view displays. List views are not bound to dates, and return `None`
pub fn visible_range(reference: NaiveDate, mode: ViewMode) -> Option<DateRange> {
    match mode {
        ViewMode::Day => Some(DateRange::single(reference)),
        ViewMode::Week => {
            let start = start_of_week(reference);
            Some(DateRange::new(start, add_days(start, 6)))
        },
        ViewMode::Month => Some(DateRange::new(first_day_of_month(reference), last_day_of_month(reference))),
        ViewMode::List => None,
    }
}

/// Number of empty cells before the 1st of the month in a Sunday-first month grid
pub fn leading_blank_cells(reference: NaiveDate) -> u32 {
    weekday_index(first_day_of_month(reference))
}

/// Move the reference date `steps` units forward (or backwards, for negative values).
///
/// A unit is a day in day mode, seven days in week mode, and a calendar month otherwise.
pub fn navigate(reference: NaiveDate, mode: ViewMode, steps: i64) -> NaiveDate {
    match mode {
        ViewMode::Day => add_days(reference, steps),
        ViewMode::Week => add_days(reference, steps.saturating_mul(7)),
        ViewMode::Month | ViewMode::List => shift_months(reference, steps),
    }
}

/// Human-readable title of the period a view displays
pub fn period_title(reference: NaiveDate, mode: ViewMode) -> String {
    match mode {
        ViewMode::Day => reference.format("%A, %-d %B %Y").to_string(),
        ViewMode::Week => {
            let start = start_of_week(reference);
            let end = add_days(start, 6);
            format!("{} - {}", start.format("%d/%m"), end.format("%d/%m"))
        },
        ViewMode::Month | ViewMode::List => reference.format("%B %Y").to_string(),
    }
}

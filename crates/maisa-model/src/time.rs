//! Precision-aware clinical timestamps.
//!
//! CDA exports mix full timestamps with partial ones (`2024`, `2024-03`).
//! [`ClinicalTime`] keeps the precision that was actually recorded so that
//! partial values can be ordered, compared against "now", and generalized
//! without inventing components.
//!
//! Ordering compares components left to right; a missing component sorts
//! before any present one, so `2024 < 2024-01 < 2024-01-01`.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use std::fmt;

/// Precision level of a [`ClinicalTime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimePrecision {
    /// `YYYY`
    Year,
    /// `YYYY-MM`
    Month,
    /// `YYYY-MM-DD`
    Day,
    /// `YYYY-MM-DDThh`
    Hour,
    /// `YYYY-MM-DDThh:mm`
    Minute,
    /// `YYYY-MM-DDThh:mm:ss`
    Second,
}

/// A calendar timestamp of year-to-second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClinicalTime {
    year: i32,
    month: Option<u32>,
    day: Option<u32>,
    hour: Option<u32>,
    minute: Option<u32>,
    second: Option<u32>,
}

impl ClinicalTime {
    /// Builds a timestamp from components.
    ///
    /// Returns `None` when a component is out of range, when the date does not
    /// exist, or when a finer component is present without a coarser one
    /// (a day without a month, for example).
    pub fn from_parts(
        year: i32,
        month: Option<u32>,
        day: Option<u32>,
        hour: Option<u32>,
        minute: Option<u32>,
        second: Option<u32>,
    ) -> Option<Self> {
        let mut truncated = false;
        for part in [month, day, hour, minute, second] {
            match (part, truncated) {
                (None, _) => truncated = true,
                (Some(_), true) => return None,
                (Some(_), false) => {}
            }
        }
        if !(0..=9999).contains(&year) {
            return None;
        }
        if month.is_some_and(|m| !(1..=12).contains(&m)) {
            return None;
        }
        if let (Some(m), Some(d)) = (month, day)
            && NaiveDate::from_ymd_opt(year, m, d).is_none()
        {
            return None;
        }
        if hour.is_some_and(|h| h > 23)
            || minute.is_some_and(|m| m > 59)
            || second.is_some_and(|s| s > 59)
        {
            return None;
        }
        Some(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: Some(date.month()),
            day: Some(date.day()),
            hour: None,
            minute: None,
            second: None,
        }
    }

    pub fn from_datetime(value: NaiveDateTime) -> Self {
        Self {
            hour: Some(value.hour()),
            minute: Some(value.minute()),
            second: Some(value.second()),
            ..Self::from_date(value.date())
        }
    }

    /// Parses an ISO 8601 extended value of any precision from `YYYY` to
    /// `YYYY-MM-DDThh:mm:ss`.
    ///
    /// Fractional seconds and a trailing zone designator (`Z`, `+hh:mm`) are
    /// accepted and discarded.
    pub fn parse_iso(value: &str) -> Option<Self> {
        let value = value.trim();
        let (date_part, time_part) = match value.split_once('T') {
            Some((date, time)) => (date, Some(time)),
            None => (value, None),
        };

        let mut date_fields = date_part.split('-');
        let year = digits(date_fields.next()?, 4)?;
        let month = component(date_fields.next())?;
        let day = component(date_fields.next())?;
        if date_fields.next().is_some() {
            return None;
        }

        let (hour, minute, second) = match time_part {
            Some(time) => {
                let time = strip_zone(time);
                let time = time.split_once('.').map_or(time, |(whole, _)| whole);
                let mut time_fields = time.split(':');
                let hour = Some(digits(time_fields.next()?, 2)?);
                let minute = component(time_fields.next())?;
                let second = component(time_fields.next())?;
                if time_fields.next().is_some() {
                    return None;
                }
                (hour, minute, second)
            }
            None => (None, None, None),
        };

        Self::from_parts(year as i32, month, day, hour, minute, second)
    }

    pub fn precision(&self) -> TimePrecision {
        if self.second.is_some() {
            TimePrecision::Second
        } else if self.minute.is_some() {
            TimePrecision::Minute
        } else if self.hour.is_some() {
            TimePrecision::Hour
        } else if self.day.is_some() {
            TimePrecision::Day
        } else if self.month.is_some() {
            TimePrecision::Month
        } else {
            TimePrecision::Year
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Option<u32> {
        self.month
    }

    pub fn day(&self) -> Option<u32> {
        self.day
    }

    /// The calendar date, when the value carries day precision or finer.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month?, self.day?)
    }

    /// Drops every component finer than `precision`. Coarser values are
    /// returned unchanged, never padded.
    pub fn truncate(&self, precision: TimePrecision) -> Self {
        let keep = |level: TimePrecision, part: Option<u32>| {
            if precision >= level { part } else { None }
        };
        Self {
            year: self.year,
            month: keep(TimePrecision::Month, self.month),
            day: keep(TimePrecision::Day, self.day),
            hour: keep(TimePrecision::Hour, self.hour),
            minute: keep(TimePrecision::Minute, self.minute),
            second: keep(TimePrecision::Second, self.second),
        }
    }

    /// Formats the value in ISO 8601 extended form at its own precision.
    pub fn to_iso(&self) -> String {
        let mut out = format!("{:04}", self.year);
        if let Some(month) = self.month {
            out.push_str(&format!("-{month:02}"));
        }
        if let Some(day) = self.day {
            out.push_str(&format!("-{day:02}"));
        }
        if let Some(hour) = self.hour {
            out.push_str(&format!("T{hour:02}"));
        }
        if let Some(minute) = self.minute {
            out.push_str(&format!(":{minute:02}"));
        }
        if let Some(second) = self.second {
            out.push_str(&format!(":{second:02}"));
        }
        out
    }
}

impl fmt::Display for ClinicalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso())
    }
}

fn digits(part: &str, len: usize) -> Option<u32> {
    if part.len() != len || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// `Some(None)` when the component is absent, `None` when it is malformed.
fn component(part: Option<&str>) -> Option<Option<u32>> {
    match part {
        Some(part) => digits(part, 2).map(Some),
        None => Some(None),
    }
}

fn strip_zone(time: &str) -> &str {
    if let Some(stripped) = time.strip_suffix('Z') {
        return stripped;
    }
    match time.find(['+', '-']) {
        Some(pos) => &time[..pos],
        None => time,
    }
}

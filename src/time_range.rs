//! Report window resolution: week, month and custom ranges.
//!
//! Every function here is pure and returns a fresh [`TimeWindow`].

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, Months, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// How the report window is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeMode {
    #[default]
    Week,
    Month,
    Custom,
}

impl FromStr for RangeMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(RangeMode::Week),
            "month" => Ok(RangeMode::Month),
            "custom" => Ok(RangeMode::Custom),
            other => Err(AppError::validation(format!("Unknown range mode '{other}'"))),
        }
    }
}

impl fmt::Display for RangeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RangeMode::Week => "week",
            RangeMode::Month => "month",
            RangeMode::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// Inclusive calendar-date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl TimeWindow {
    /// Whether `date` falls inside the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Number of calendar days covered.
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Whether `start..=end` intersects the window.
    ///
    /// Either endpoint inside the window, or the range spanning it entirely.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        let starts_inside = self.contains(start);
        let ends_inside = self.contains(end);
        let spans = start < self.start_date && end > self.end_date;
        starts_inside || ends_inside || spans
    }

    /// Calendar days of `start..=end` that fall inside the window.
    pub fn overlap_days(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        let from = start.max(self.start_date);
        let to = end.min(self.end_date);
        if from > to { 0 } else { (to - from).num_days() + 1 }
    }
}

/// Monday-to-Sunday week containing `reference`.
pub fn resolve_week(reference: NaiveDate) -> TimeWindow {
    let offset = i64::from(reference.weekday().num_days_from_monday());
    let start_date = reference - TimeDelta::days(offset);
    TimeWindow {
        start_date,
        end_date: start_date + TimeDelta::days(6),
    }
}

/// First to last calendar day of the month containing `reference`.
pub fn resolve_month(reference: NaiveDate) -> TimeWindow {
    let start_date = reference.with_day(1).unwrap_or(reference);
    // Last day is the day before the 1st of the following month.
    let end_date = start_date
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(start_date);
    TimeWindow { start_date, end_date }
}

/// Caller-supplied window; rejected when `start > end`.
pub fn resolve_custom(start: NaiveDate, end: NaiveDate) -> Result<TimeWindow> {
    if start > end {
        return Err(AppError::InvalidRange { start, end });
    }
    Ok(TimeWindow {
        start_date: start,
        end_date: end,
    })
}

/// Resolve a window from a range mode.
///
/// `custom` carries the explicit bounds and is only read for [`RangeMode::Custom`].
pub fn resolve(mode: RangeMode, anchor: NaiveDate, custom: Option<(NaiveDate, NaiveDate)>) -> Result<TimeWindow> {
    match mode {
        RangeMode::Week => Ok(resolve_week(anchor)),
        RangeMode::Month => Ok(resolve_month(anchor)),
        RangeMode::Custom => {
            let (start, end) =
                custom.ok_or_else(|| AppError::validation("Custom range requires both start and end dates"))?;
            resolve_custom(start, end)
        }
    }
}

/// Week number of `date`.
///
/// Days elapsed since 1 January plus January 1st's Sunday-based weekday
/// offset, ceil-divided by seven.
pub fn week_number(date: NaiveDate) -> u32 {
    let jan_first = NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date);
    let elapsed = date.ordinal0();
    let offset = jan_first.weekday().num_days_from_sunday();
    (elapsed + offset + 1).div_ceil(7)
}

/// `"Week 10, 2025"` for the window's start date.
pub fn week_label(window: &TimeWindow) -> String {
    format!("Week {}, {}", week_number(window.start_date), window.start_date.year())
}

/// `"03/03 – 09/03/2025"`.
pub fn format_range_label(window: &TimeWindow) -> String {
    format!(
        "{} – {}",
        window.start_date.format("%d/%m"),
        window.end_date.format("%d/%m/%Y")
    )
}

/// Move a window by whole weeks.
pub fn shift_week(window: &TimeWindow, weeks: i32) -> TimeWindow {
    let delta = TimeDelta::weeks(i64::from(weeks));
    TimeWindow {
        start_date: window.start_date + delta,
        end_date: window.end_date + delta,
    }
}

/// Month window `months` away from the one containing `window.start_date`.
pub fn shift_month(window: &TimeWindow, months: i32) -> TimeWindow {
    let anchor = window.start_date.with_day(1).unwrap_or(window.start_date);
    let magnitude = Months::new(months.unsigned_abs());
    let shifted = if months >= 0 {
        anchor.checked_add_months(magnitude)
    } else {
        anchor.checked_sub_months(magnitude)
    };
    resolve_month(shifted.unwrap_or(anchor))
}

/// Trailing `days`-day window ending on `today` (inclusive).
pub fn last_n_days(today: NaiveDate, days: u32) -> TimeWindow {
    let span = i64::from(days.max(1)) - 1;
    TimeWindow {
        start_date: today - TimeDelta::days(span),
        end_date: today,
    }
}

/// Window for `mode` anchored on `today`; custom collapses to the single day.
pub fn reset(mode: RangeMode, today: NaiveDate) -> TimeWindow {
    match mode {
        RangeMode::Week => resolve_week(today),
        RangeMode::Month => resolve_month(today),
        RangeMode::Custom => TimeWindow {
            start_date: today,
            end_date: today,
        },
    }
}

/// [`reset`] against the local calendar date.
pub fn today(mode: RangeMode) -> TimeWindow {
    reset(mode, Local::now().date_naive())
}

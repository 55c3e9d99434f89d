// src/ingest/window.rs
//! Half-open time windows and the window filter.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// `[start, end)` in UTC. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::invalid(
                "window",
                format!("start {start} is after end {end}"),
            ));
        }
        Ok(Self { start, end })
    }

    /// The full UTC calendar day before `now`.
    pub fn previous_day(now: DateTime<Utc>) -> Self {
        let today = midnight(now);
        Self {
            start: today - ChronoDuration::days(1),
            end: today,
        }
    }

    /// The UTC calendar day containing `now`.
    pub fn current_day(now: DateTime<Utc>) -> Self {
        let today = midnight(now);
        Self {
            start: today,
            end: today + ChronoDuration::days(1),
        }
    }

    /// From January 1 of the previous UTC year up to January 1 of the next.
    /// Fits dates published with year or month precision only.
    pub fn recent_years(now: DateTime<Utc>) -> Self {
        let year = now.year();
        Self {
            start: year_start(year - 1).unwrap_or(now),
            end: year_start(year + 1).unwrap_or(now),
        }
    }

    /// `[now - hours, now)`.
    pub fn trailing_hours(now: DateTime<Utc>, hours: u32) -> Self {
        Self {
            start: now - ChronoDuration::hours(i64::from(hours)),
            end: now,
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

fn midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn year_start(year: i32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, 1, 1).map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

/// How a run derives its window from the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSpec {
    PreviousDay,
    CurrentDay,
    RecentYears,
    TrailingHours(u32),
}

impl WindowSpec {
    pub fn resolve(&self, now: DateTime<Utc>) -> TimeWindow {
        match self {
            WindowSpec::PreviousDay => TimeWindow::previous_day(now),
            WindowSpec::CurrentDay => TimeWindow::current_day(now),
            WindowSpec::RecentYears => TimeWindow::recent_years(now),
            WindowSpec::TrailingHours(h) => TimeWindow::trailing_hours(now, *h),
        }
    }
}

impl FromStr for WindowSpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = s.trim().to_ascii_lowercase();
        match v.as_str() {
            "previous-day" | "yesterday" => Ok(WindowSpec::PreviousDay),
            "current-day" | "today" => Ok(WindowSpec::CurrentDay),
            "recent-years" => Ok(WindowSpec::RecentYears),
            _ => {
                let hours = v
                    .strip_prefix("trailing:")
                    .and_then(|h| h.trim().parse::<u32>().ok())
                    .filter(|h| *h > 0)
                    .ok_or_else(|| {
                        ConfigError::invalid(
                            "RELAY_WINDOW",
                            format!("expected previous-day, current-day, recent-years or trailing:<hours>, got {s:?}"),
                        )
                    })?;
                Ok(WindowSpec::TrailingHours(hours))
            }
        }
    }
}

/// Anything the window filter can place on the time axis.
pub trait Timestamped {
    /// `None` when no usable timestamp can be derived.
    fn timestamp(&self) -> Option<DateTime<Utc>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowFiltered<T> {
    pub kept: Vec<T>,
    pub outside_window: usize,
    pub untimed: usize,
}

/// Keep records with `start <= ts < end`, in input order. Records without a
/// usable timestamp are dropped and counted, never raised.
pub fn filter_window<T: Timestamped>(records: Vec<T>, window: &TimeWindow) -> WindowFiltered<T> {
    let mut kept = Vec::with_capacity(records.len());
    let mut outside_window = 0usize;
    let mut untimed = 0usize;

    for rec in records {
        match rec.timestamp() {
            Some(ts) if window.contains(ts) => kept.push(rec),
            Some(_) => outside_window += 1,
            None => untimed += 1,
        }
    }

    WindowFiltered {
        kept,
        outside_window,
        untimed,
    }
}

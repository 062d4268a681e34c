//! Calendar view modes and the date window each one shows.

use chrono::{DateTime, Datelike, Days, Local, Months, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::event::CalendarEvent;

/// Number of days shown by the agenda view.
const AGENDA_LENGTH_DAYS: u64 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarView {
    Month,
    #[default]
    Week,
    WorkWeek,
    Day,
    Agenda,
}

impl CalendarView {
    pub const ALL: [CalendarView; 5] = [
        CalendarView::Month,
        CalendarView::Week,
        CalendarView::WorkWeek,
        CalendarView::Day,
        CalendarView::Agenda,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarView::Month => "month",
            CalendarView::Week => "week",
            CalendarView::WorkWeek => "work_week",
            CalendarView::Day => "day",
            CalendarView::Agenda => "agenda",
        }
    }

    /// First and last calendar day this view shows when positioned on `date`.
    /// Weeks start on Monday.
    pub fn days(&self, date: NaiveDate) -> (NaiveDate, NaiveDate) {
        let monday = date - Days::new(u64::from(date.weekday().num_days_from_monday()));

        match self {
            CalendarView::Day => (date, date),
            CalendarView::Week => (monday, monday + Days::new(6)),
            CalendarView::WorkWeek => (monday, monday + Days::new(4)),
            CalendarView::Month => {
                let first = date.with_day(1).unwrap_or(date);
                let last = (first + Months::new(1)) - Days::new(1);
                (first, last)
            }
            CalendarView::Agenda => (date, date + Days::new(AGENDA_LENGTH_DAYS - 1)),
        }
    }

    /// The window this view shows around `date`, with days in local time.
    pub fn range(&self, date: NaiveDate) -> DateRange {
        self.range_in(date, &Local)
    }

    /// The window this view shows around `date`, with days in `tz`.
    pub fn range_in<Tz: TimeZone>(&self, date: NaiveDate, tz: &Tz) -> DateRange {
        let (first, last) = self.days(date);
        DateRange::days(first, last, tz)
    }
}

impl fmt::Display for CalendarView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CalendarView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "month" => Ok(CalendarView::Month),
            "week" => Ok(CalendarView::Week),
            "work_week" | "workweek" => Ok(CalendarView::WorkWeek),
            "day" => Ok(CalendarView::Day),
            "agenda" => Ok(CalendarView::Agenda),
            other => Err(format!(
                "Unknown view '{}'. Expected one of: month, week, work_week, day, agenda",
                other
            )),
        }
    }
}

/// Half-open time window `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    /// From the start of `first` to the end of `last`, as days in `tz`.
    pub fn days<Tz: TimeZone>(first: NaiveDate, last: NaiveDate, tz: &Tz) -> Self {
        DateRange {
            from: start_of_day(first, tz),
            to: start_of_day(last + Days::new(1), tz),
        }
    }

    /// Whether an event overlaps this window at all. Zero-length events count
    /// when they start inside it.
    pub fn overlaps(&self, event: &CalendarEvent) -> bool {
        event.start < self.to && (event.end > self.from || event.start >= self.from)
    }
}

fn start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        // Midnight skipped by a DST jump
        .or_else(|| tz.from_local_datetime(&(midnight + TimeDelta::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

// src/calendar.rs

//! Workday calendar and date arithmetic.
//!
//! A date is a workday iff it is not a Saturday or Sunday and is not in the
//! holiday set. All stepping operations move one calendar day at a time, so
//! they cost O(days walked). To keep a pathological calendar (e.g. years of
//! consecutive holidays) from hanging the process, every walk gives up after
//! [`MAX_NON_WORKDAY_RUN`] consecutive non-workdays.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, Local, NaiveDate, Weekday};

use crate::errors::{GanttError, Result};

/// Wire format of a calendar date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Longest run of consecutive non-workdays a walk will cross before failing.
pub const MAX_NON_WORKDAY_RUN: u32 = 3660;

/// Direction used when snapping a date onto a workday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Calendar {
    holidays: BTreeSet<NaiveDate>,
}

impl Calendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_holidays<I>(holidays: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Holidays in ascending order.
    pub fn holidays(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.holidays.iter().copied()
    }

    pub fn holiday_count(&self) -> usize {
        self.holidays.len()
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    /// Returns `true` if the holiday was not already present.
    pub fn add_holiday(&mut self, date: NaiveDate) -> bool {
        self.holidays.insert(date)
    }

    /// Returns `true` if the holiday was present.
    pub fn remove_holiday(&mut self, date: NaiveDate) -> bool {
        self.holidays.remove(&date)
    }

    pub fn set_holidays<I>(&mut self, holidays: I)
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        self.holidays = holidays.into_iter().collect();
    }

    pub fn is_workday(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.is_holiday(date)
    }

    /// `date` itself if it is a workday, else the first workday reached by
    /// walking in `direction`.
    pub fn next_workday(&self, date: NaiveDate, direction: Direction) -> Result<NaiveDate> {
        let mut current = date;
        let mut idle = 0u32;
        while !self.is_workday(current) {
            idle += 1;
            if idle > MAX_NON_WORKDAY_RUN {
                return Err(GanttError::CalendarExhausted { from: date });
            }
            current = step(current, direction, date)?;
        }
        Ok(current)
    }

    /// Walk `n` workdays away from `date` (backwards for negative `n`).
    ///
    /// The starting date itself is never counted, so `add_workdays(d, 0)` is
    /// `d` even when `d` is not a workday.
    pub fn add_workdays(&self, date: NaiveDate, n: i64) -> Result<NaiveDate> {
        if n == 0 {
            return Ok(date);
        }
        let direction = if n > 0 {
            Direction::Forward
        } else {
            Direction::Backward
        };

        let mut remaining = n.unsigned_abs();
        let mut current = date;
        let mut idle = 0u32;
        while remaining > 0 {
            current = step(current, direction, date)?;
            if self.is_workday(current) {
                remaining -= 1;
                idle = 0;
            } else {
                idle += 1;
                if idle > MAX_NON_WORKDAY_RUN {
                    return Err(GanttError::CalendarExhausted { from: date });
                }
            }
        }
        Ok(current)
    }

    /// Number of workdays in `[start, end]`, floored at 1.
    pub fn workday_count(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        if end < start {
            return 1;
        }
        let count = start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| self.is_workday(*d))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX).max(1)
    }
}

fn step(date: NaiveDate, direction: Direction, origin: NaiveDate) -> Result<NaiveDate> {
    let next = match direction {
        Direction::Forward => date.checked_add_days(Days::new(1)),
        Direction::Backward => date.checked_sub_days(Days::new(1)),
    };
    next.ok_or(GanttError::CalendarExhausted { from: origin })
}

/// Strict `YYYY-MM-DD` parse.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Local calendar date, used as the default start of new tasks.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

use chrono::{Datelike, NaiveDate, Weekday};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt, ops::Range, str::FromStr};
use thiserror::Error;

lazy_static! {
    static ref WINDOW_PATTERN: Regex = Regex::new(
        r"^\s*(\d{1,2}):(\d{2})\s*([AaPp][Mm])\s*-\s*(\d{1,2}):(\d{2})\s*([AaPp][Mm])\s*$"
    )
    .unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpeningHoursError {
    #[error("`{0}` is not of the form `6:00 AM - 10:00 PM`")]
    Malformed(String),
    #[error("`{0}` does not start on a full hour")]
    NotOnTheHour(String),
    #[error("{0} is not an hour on a 12-hour clock")]
    HourOutOfRange(u32),
}

/// Bookable hours of a ground on one category of day.
///
/// `close_hour` is exclusive and may be 24. A window with
/// `open_hour >= close_hour` is degenerate and contains no hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingWindow {
    pub open_hour: u32,
    pub close_hour: u32,
}

impl OperatingWindow {
    pub const fn new(open_hour: u32, close_hour: u32) -> Self {
        Self {
            open_hour,
            close_hour,
        }
    }

    pub const fn hours(self) -> Range<u32> {
        self.open_hour..self.close_hour
    }
}

impl FromStr for OperatingWindow {
    type Err = OpeningHoursError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = WINDOW_PATTERN
            .captures(s)
            .ok_or_else(|| OpeningHoursError::Malformed(s.into()))?;
        if &captures[2] != "00" || &captures[5] != "00" {
            return Err(OpeningHoursError::NotOnTheHour(s.into()));
        }

        let open_hour = to_24_hour(&captures[1], &captures[3])?;
        let close_hour = match to_24_hour(&captures[4], &captures[6])? {
            0 => 24, // closing at midnight
            hour => hour,
        };
        Ok(Self::new(open_hour, close_hour))
    }
}

impl fmt::Display for OperatingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            to_12_hour(self.open_hour),
            to_12_hour(self.close_hour)
        )
    }
}

fn to_24_hour(hour: &str, meridiem: &str) -> Result<u32, OpeningHoursError> {
    // At most two digits, guaranteed by the pattern.
    let hour: u32 = hour
        .parse()
        .map_err(|_| OpeningHoursError::Malformed(hour.into()))?;
    if !(1..=12).contains(&hour) {
        return Err(OpeningHoursError::HourOutOfRange(hour));
    }
    let is_pm = meridiem.eq_ignore_ascii_case("pm");
    Ok(match (hour, is_pm) {
        (12, false) => 0,
        (12, true) => 12,
        (hour, false) => hour,
        (hour, true) => hour + 12,
    })
}

fn to_12_hour(hour: u32) -> String {
    let meridiem = if hour % 24 < 12 { "AM" } else { "PM" };
    let hour = match hour % 12 {
        0 => 12,
        hour => hour,
    };
    format!("{hour}:00 {meridiem}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayCategory {
    Weekday,
    Weekend,
}

impl From<NaiveDate> for DayCategory {
    fn from(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => Self::Weekend,
            _ => Self::Weekday,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHours {
    pub weekdays: OperatingWindow,
    pub weekends: OperatingWindow,
}

impl OpeningHours {
    pub const fn uniform(window: OperatingWindow) -> Self {
        Self {
            weekdays: window,
            weekends: window,
        }
    }

    pub fn window_for(&self, date: NaiveDate) -> OperatingWindow {
        match DayCategory::from(date) {
            DayCategory::Weekday => self.weekdays,
            DayCategory::Weekend => self.weekends,
        }
    }
}

impl Default for OpeningHours {
    fn default() -> Self {
        Self {
            weekdays: OperatingWindow::new(6, 22),
            weekends: OperatingWindow::new(5, 23),
        }
    }
}

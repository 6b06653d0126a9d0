use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Days before the dose date on which a reminder fires, earliest first.
pub const REMINDER_OFFSETS_DAYS: [i64; 3] = [3, 1, 0];

pub const CALENDAR_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidDateError {
    #[error("'{0}' is not a calendar date in YYYY-MM-DD form")]
    Malformed(String),

    #[error("reminder dates for {0} fall outside the supported calendar range")]
    OutOfRange(NaiveDate),

    #[error("stored reminder dates {0:?} do not match a dose date")]
    Inconsistent(Vec<NaiveDate>),
}

/// The three calendar dates on which a dose reminder is sent:
/// the dose date minus three days, minus one day, and the dose date itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<NaiveDate>", into = "Vec<NaiveDate>")]
pub struct ReminderDates([NaiveDate; 3]);

pub fn compute_reminder_dates(next_dose_date: NaiveDate) -> Result<ReminderDates, InvalidDateError> {
    let mut dates = [next_dose_date; 3];
    for (slot, offset) in dates.iter_mut().zip(REMINDER_OFFSETS_DAYS) {
        *slot = next_dose_date
            .checked_sub_signed(TimeDelta::days(offset))
            .ok_or(InvalidDateError::OutOfRange(next_dose_date))?;
    }

    Ok(ReminderDates(dates))
}

/// Accepts either a bare `YYYY-MM-DD` date or an ISO 8601 date-time, in which
/// case the time-of-day component is discarded.
pub fn parse_calendar_date(value: &str) -> Result<NaiveDate, InvalidDateError> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, CALENDAR_DATE_FORMAT) {
        return Ok(date);
    }

    if let Ok(date_time) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Ok(date_time.date_naive());
    }

    trimmed
        .parse::<NaiveDateTime>()
        .map(|date_time| date_time.date())
        .map_err(|_| InvalidDateError::Malformed(value.to_owned()))
}

pub fn compute_reminder_dates_from_str(next_dose_date: &str) -> Result<ReminderDates, InvalidDateError> {
    compute_reminder_dates(parse_calendar_date(next_dose_date)?)
}

pub fn format_calendar_date(date: NaiveDate) -> String {
    date.format(CALENDAR_DATE_FORMAT).to_string()
}

impl ReminderDates {
    pub fn dates(&self) -> &[NaiveDate; 3] {
        &self.0
    }

    pub fn next_dose_date(&self) -> NaiveDate {
        self.0[2]
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.0.contains(&date)
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().copied().map(format_calendar_date).collect()
    }
}

impl TryFrom<Vec<NaiveDate>> for ReminderDates {
    type Error = InvalidDateError;

    fn try_from(value: Vec<NaiveDate>) -> Result<Self, Self::Error> {
        let Some(next_dose_date) = value.last().copied() else {
            return Err(InvalidDateError::Inconsistent(value));
        };

        let expected = compute_reminder_dates(next_dose_date)?;
        if expected.0[..] == value[..] {
            Ok(expected)
        } else {
            Err(InvalidDateError::Inconsistent(value))
        }
    }
}

impl From<ReminderDates> for Vec<NaiveDate> {
    fn from(value: ReminderDates) -> Self {
        value.0.to_vec()
    }
}

impl fmt::Display for ReminderDates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_strings().join(", "))
    }
}

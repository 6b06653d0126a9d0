use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reminder_dates::{InvalidDateError, ReminderDates, compute_reminder_dates};

pub type PatientId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = PatientValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Sex::Male),
            "F" => Ok(Sex::Female),
            other => Err(PatientValidationError::UnknownSex(other.to_owned())),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatientValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("days until next dose must be positive, got {0}")]
    NonPositiveInterval(i64),

    #[error("unknown sex '{0}', expected 'M' or 'F'")]
    UnknownSex(String),

    #[error(transparent)]
    InvalidDate(#[from] InvalidDateError),
}

/// Details captured when a patient is onboarded or edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPatient {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub phone_number: String,
    pub sex: Sex,
    pub drug_category: String,
    pub drug: String,
    pub purchase_date: NaiveDate,
    pub days_until_next_dose: i64,
}

/// Dose schedule derived from a purchase date and dosing interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoseSchedule {
    pub next_dose_date: NaiveDate,
    pub reminder_dates: ReminderDates,
}

impl NewPatient {
    pub fn validate(&self) -> Result<(), PatientValidationError> {
        let required = [
            ("firstname", &self.firstname),
            ("lastname", &self.lastname),
            ("email", &self.email),
            ("drug_category", &self.drug_category),
            ("drug", &self.drug),
        ];

        if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(PatientValidationError::MissingField(*name));
        }

        if self.days_until_next_dose <= 0 {
            return Err(PatientValidationError::NonPositiveInterval(
                self.days_until_next_dose,
            ));
        }

        Ok(())
    }

    pub fn dose_schedule(&self) -> Result<DoseSchedule, PatientValidationError> {
        self.validate()?;

        let next_dose_date = TimeDelta::try_days(self.days_until_next_dose)
            .and_then(|interval| self.purchase_date.checked_add_signed(interval))
            .ok_or(InvalidDateError::OutOfRange(self.purchase_date))?;
        let reminder_dates = compute_reminder_dates(next_dose_date)?;

        Ok(DoseSchedule {
            next_dose_date,
            reminder_dates,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub phone_number: String,
    pub sex: Sex,
    pub drug_category: String,
    pub drug: String,
    pub purchase_date: NaiveDate,
    pub days_until_next_dose: i64,
    pub next_dose_date: NaiveDate,
    pub reminder_dates: ReminderDates,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

use dosealert_models::{
    chrono::{DateTime, NaiveDate, Utc},
    patient::{DoseSchedule, NewPatient, Patient, PatientId, Sex},
    reminder_dates::{CALENDAR_DATE_FORMAT, ReminderDates, format_calendar_date},
};

use crate::StorageError;

#[derive(sqlx::FromRow, Debug)]
pub struct PatientStorageModel {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub phone_number: String,
    pub sex: String,
    pub drug_category: String,
    pub drug: String,
    pub purchase_date: String,
    pub days_until_next_dose: i64,
    pub next_dose_date: String,
    pub reminder_dates: String,
    pub deleted_at: Option<String>,
}

/// Column values written on onboarding and edit.
pub struct PatientColumns {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub phone_number: String,
    pub sex: &'static str,
    pub drug_category: String,
    pub drug: String,
    pub purchase_date: String,
    pub days_until_next_dose: i64,
    pub next_dose_date: String,
    pub reminder_dates: String,
}

impl PatientColumns {
    pub fn new(patient: NewPatient, schedule: DoseSchedule) -> Result<Self, StorageError> {
        let reminder_dates = serde_json::to_string(&schedule.reminder_dates)?;

        Ok(Self {
            firstname: patient.firstname.trim().to_owned(),
            lastname: patient.lastname.trim().to_owned(),
            email: patient.email.trim().to_owned(),
            phone_number: patient.phone_number.trim().to_owned(),
            sex: patient.sex.as_str(),
            drug_category: patient.drug_category.trim().to_owned(),
            drug: patient.drug.trim().to_owned(),
            purchase_date: format_calendar_date(patient.purchase_date),
            days_until_next_dose: patient.days_until_next_dose,
            next_dose_date: format_calendar_date(schedule.next_dose_date),
            reminder_dates,
        })
    }
}

impl TryFrom<PatientStorageModel> for Patient {
    type Error = StorageError;

    fn try_from(value: PatientStorageModel) -> Result<Self, Self::Error> {
        let id = value.id;
        let corrupt = |reason: String| StorageError::CorruptRecord { id, reason };

        let reminder_dates: ReminderDates =
            serde_json::from_str(&value.reminder_dates).map_err(|e| corrupt(e.to_string()))?;
        let next_dose_date = parse_date(id, &value.next_dose_date)?;
        if reminder_dates.next_dose_date() != next_dose_date {
            return Err(corrupt(format!(
                "reminder dates [{reminder_dates}] do not end on next dose date {next_dose_date}"
            )));
        }

        let deleted_at = value
            .deleted_at
            .as_deref()
            .map(|raw| {
                DateTime::parse_from_rfc3339(raw)
                    .map(|date_time| date_time.with_timezone(&Utc))
                    .map_err(|e| corrupt(e.to_string()))
            })
            .transpose()?;

        Ok(Patient {
            id,
            firstname: value.firstname,
            lastname: value.lastname,
            email: value.email,
            phone_number: value.phone_number,
            sex: value
                .sex
                .parse::<Sex>()
                .map_err(|e| corrupt(e.to_string()))?,
            drug_category: value.drug_category,
            drug: value.drug,
            purchase_date: parse_date(id, &value.purchase_date)?,
            days_until_next_dose: value.days_until_next_dose,
            next_dose_date,
            reminder_dates,
            deleted_at,
        })
    }
}

fn parse_date(id: PatientId, raw: &str) -> Result<NaiveDate, StorageError> {
    NaiveDate::parse_from_str(raw, CALENDAR_DATE_FORMAT).map_err(|e| StorageError::CorruptRecord {
        id,
        reason: format!("'{raw}' is not a calendar date: {e}"),
    })
}

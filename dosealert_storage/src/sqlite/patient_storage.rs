mod model;

use async_trait::async_trait;
use dosealert_models::{
    chrono::{NaiveDate, Utc},
    patient::{NewPatient, Patient, PatientId},
    reminder_dates::format_calendar_date,
};
use model::{PatientColumns, PatientStorageModel};
use sqlx::{Sqlite, SqlitePool, query::QueryAs, sqlite::SqliteArguments};

use super::drug_catalog::drug_is_listed;
use crate::{
    PatientQuery, PatientReminderQuery, PatientStorage, SEARCH_RESULT_LIMIT, StorageError,
};

pub struct SqlitePatientStorage {
    pool: SqlitePool,
}

impl SqlitePatientStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn columns(&self, patient: NewPatient) -> Result<PatientColumns, StorageError> {
        let schedule = patient.dose_schedule()?;
        let columns = PatientColumns::new(patient, schedule)?;

        if !drug_is_listed(&self.pool, &columns.drug_category, &columns.drug).await? {
            return Err(StorageError::UnlistedDrug {
                drug_category: columns.drug_category,
                drug: columns.drug,
            });
        }

        Ok(columns)
    }

    async fn fetch_all<'q>(
        &self,
        query: QueryAs<'q, Sqlite, PatientStorageModel, SqliteArguments<'q>>,
    ) -> Result<Vec<Patient>, StorageError> {
        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Patient::try_from)
            .collect()
    }
}

fn like_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', r"\\")
        .replace('%', r"\%")
        .replace('_', r"\_");
    format!("%{escaped}%")
}

#[async_trait]
impl PatientStorage for SqlitePatientStorage {
    async fn get(&self, id: PatientId) -> Result<Option<Patient>, StorageError> {
        let patient = sqlx::query_as::<_, PatientStorageModel>("SELECT * FROM patients WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        patient.map(Patient::try_from).transpose()
    }

    async fn insert(&self, patient: NewPatient) -> Result<Patient, StorageError> {
        let columns = self.columns(patient).await?;

        let created = sqlx::query_as::<_, PatientStorageModel>(
            "
INSERT INTO patients (
    firstname, lastname, email, phone_number, sex, drug_category, drug,
    purchase_date, days_until_next_dose, next_dose_date, reminder_dates
)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
RETURNING *
",
        )
        .bind(columns.firstname)
        .bind(columns.lastname)
        .bind(columns.email)
        .bind(columns.phone_number)
        .bind(columns.sex)
        .bind(columns.drug_category)
        .bind(columns.drug)
        .bind(columns.purchase_date)
        .bind(columns.days_until_next_dose)
        .bind(columns.next_dose_date)
        .bind(columns.reminder_dates)
        .fetch_one(&self.pool)
        .await?;

        log::info!("Onboarded patient {}", created.id);
        created.try_into()
    }

    async fn update(&self, id: PatientId, patient: NewPatient) -> Result<Patient, StorageError> {
        let columns = self.columns(patient).await?;

        let updated = sqlx::query_as::<_, PatientStorageModel>(
            "
UPDATE patients
SET firstname = ?,
    lastname = ?,
    email = ?,
    phone_number = ?,
    sex = ?,
    drug_category = ?,
    drug = ?,
    purchase_date = ?,
    days_until_next_dose = ?,
    next_dose_date = ?,
    reminder_dates = ?
WHERE id = ?
RETURNING *
",
        )
        .bind(columns.firstname)
        .bind(columns.lastname)
        .bind(columns.email)
        .bind(columns.phone_number)
        .bind(columns.sex)
        .bind(columns.drug_category)
        .bind(columns.drug)
        .bind(columns.purchase_date)
        .bind(columns.days_until_next_dose)
        .bind(columns.next_dose_date)
        .bind(columns.reminder_dates)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound(id))?;

        log::info!("Updated patient {id}");
        updated.try_into()
    }

    async fn list_active(&self) -> Result<Vec<Patient>, StorageError> {
        self.fetch_all(sqlx::query_as(
            "SELECT * FROM patients WHERE deleted_at IS NULL ORDER BY id",
        ))
        .await
    }

    async fn list_deleted(&self) -> Result<Vec<Patient>, StorageError> {
        self.fetch_all(sqlx::query_as(
            "SELECT * FROM patients WHERE deleted_at IS NOT NULL ORDER BY id",
        ))
        .await
    }

    async fn soft_delete(&self, id: PatientId) -> Result<Patient, StorageError> {
        let deleted = sqlx::query_as::<_, PatientStorageModel>(
            "UPDATE patients SET deleted_at = COALESCE(deleted_at, ?) WHERE id = ? RETURNING *",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound(id))?;

        log::info!("Moved patient {id} to trash bin");
        deleted.try_into()
    }

    async fn restore(&self, id: PatientId) -> Result<Patient, StorageError> {
        let restored = sqlx::query_as::<_, PatientStorageModel>(
            "UPDATE patients SET deleted_at = NULL WHERE id = ? RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound(id))?;

        log::info!("Restored patient {id}");
        restored.try_into()
    }

    async fn search(&self, query: &PatientQuery) -> Result<Vec<Patient>, StorageError> {
        let query = match query {
            PatientQuery::FullName {
                firstname,
                lastname,
            } => sqlx::query_as(
                r"
SELECT * FROM patients
WHERE deleted_at IS NULL
  AND firstname LIKE ? ESCAPE '\'
  AND lastname LIKE ? ESCAPE '\'
ORDER BY id LIMIT ?
",
            )
            .bind(like_pattern(firstname))
            .bind(like_pattern(lastname)),
            PatientQuery::Email(email) => sqlx::query_as(
                r"
SELECT * FROM patients
WHERE deleted_at IS NULL AND email LIKE ? ESCAPE '\'
ORDER BY id LIMIT ?
",
            )
            .bind(like_pattern(email)),
            PatientQuery::Phone(phone_number) => sqlx::query_as(
                r"
SELECT * FROM patients
WHERE deleted_at IS NULL AND phone_number LIKE ? ESCAPE '\'
ORDER BY id LIMIT ?
",
            )
            .bind(like_pattern(phone_number)),
            PatientQuery::Any(text) => {
                let pattern = like_pattern(text);
                sqlx::query_as(
                    r"
SELECT * FROM patients
WHERE deleted_at IS NULL
  AND (firstname LIKE ? ESCAPE '\'
       OR lastname LIKE ? ESCAPE '\'
       OR email LIKE ? ESCAPE '\')
ORDER BY id LIMIT ?
",
                )
                .bind(pattern.clone())
                .bind(pattern.clone())
                .bind(pattern)
            }
        };

        self.fetch_all(query.bind(SEARCH_RESULT_LIMIT)).await
    }
}

#[async_trait]
impl PatientReminderQuery for SqlitePatientStorage {
    async fn find_patients_with_reminder_on(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<Patient>, StorageError> {
        self.fetch_all(
            sqlx::query_as(
                "
SELECT * FROM patients
WHERE deleted_at IS NULL
  AND EXISTS (SELECT 1 FROM json_each(patients.reminder_dates) WHERE json_each.value = ?)
ORDER BY id
",
            )
            .bind(format_calendar_date(date)),
        )
        .await
    }
}

#[cfg(test)]
mod tests;

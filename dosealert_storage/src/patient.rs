use async_trait::async_trait;
use dosealert_models::{
    chrono::NaiveDate,
    drug::{DrugCategoryId, DrugId},
    patient::{NewPatient, Patient, PatientId, PatientValidationError},
};
use thiserror::Error;

pub const SEARCH_RESULT_LIMIT: u32 = 10;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("patient {0} does not exist")]
    NotFound(PatientId),

    #[error(transparent)]
    InvalidPatient(#[from] PatientValidationError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error("stored record for patient {id} is corrupt: {reason}")]
    CorruptRecord { id: PatientId, reason: String },

    #[error("search query is required")]
    EmptySearchQuery,

    #[error("drug category {0} does not exist")]
    CategoryNotFound(DrugCategoryId),

    #[error("drug {0} does not exist")]
    DrugNotFound(DrugId),

    #[error("{0} name is required")]
    EmptyCatalogName(&'static str),

    #[error("'{0}' is already in the drug catalog")]
    DuplicateCatalogEntry(String),

    #[error("drug '{drug}' is not listed under category '{drug_category}'")]
    UnlistedDrug { drug_category: String, drug: String },
}

/// How a free-text patient search is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatientQuery {
    FullName { firstname: String, lastname: String },
    Email(String),
    Phone(String),
    Any(String),
}

impl PatientQuery {
    pub fn parse(query: &str) -> Result<Self, StorageError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(StorageError::EmptySearchQuery);
        }

        let parts: Vec<&str> = query.split_whitespace().collect();
        if let [firstname, lastname] = parts[..] {
            return Ok(PatientQuery::FullName {
                firstname: firstname.to_owned(),
                lastname: lastname.to_owned(),
            });
        }

        if query.contains('@') {
            Ok(PatientQuery::Email(query.to_owned()))
        } else if is_phone_number(query) {
            Ok(PatientQuery::Phone(query.to_owned()))
        } else {
            Ok(PatientQuery::Any(query.to_owned()))
        }
    }
}

fn is_phone_number(query: &str) -> bool {
    let digits = query.strip_prefix('+').unwrap_or(query);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Patient records as managed from the admin dashboard.
#[async_trait]
pub trait PatientStorage: Send + Sync {
    async fn get(&self, id: PatientId) -> Result<Option<Patient>, StorageError>;
    async fn insert(&self, patient: NewPatient) -> Result<Patient, StorageError>;
    async fn update(&self, id: PatientId, patient: NewPatient) -> Result<Patient, StorageError>;
    async fn list_active(&self) -> Result<Vec<Patient>, StorageError>;
    async fn list_deleted(&self) -> Result<Vec<Patient>, StorageError>;
    async fn soft_delete(&self, id: PatientId) -> Result<Patient, StorageError>;
    async fn restore(&self, id: PatientId) -> Result<Patient, StorageError>;
    async fn search(&self, query: &PatientQuery) -> Result<Vec<Patient>, StorageError>;
}

/// The lookup the daily reminder sweep runs against the patient store.
#[async_trait]
pub trait PatientReminderQuery: Send + Sync {
    async fn find_patients_with_reminder_on(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<Patient>, StorageError>;
}

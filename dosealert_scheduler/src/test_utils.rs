use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use dosealert_email::{EmailError, EmailMessage, EmailSender, StatusCode};
use dosealert_models::{
    chrono::{DateTime, NaiveDate, TimeDelta, Utc},
    patient::{Patient, PatientId, Sex},
    reminder_dates::compute_reminder_dates,
};
use dosealert_storage::{PatientReminderQuery, StorageError};
use tokio::sync::Notify;

use crate::Clock;

pub fn patient_due_on(id: PatientId, next_dose_date: NaiveDate) -> Patient {
    Patient {
        id,
        firstname: format!("Patient{id}"),
        lastname: "Kamau".to_owned(),
        email: format!("patient{id}@example.com"),
        phone_number: "+254700000000".to_owned(),
        sex: Sex::Male,
        drug_category: "Antibiotics".to_owned(),
        drug: "Amoxicillin".to_owned(),
        purchase_date: next_dose_date - TimeDelta::days(7),
        days_until_next_dose: 7,
        next_dose_date,
        reminder_dates: compute_reminder_dates(next_dose_date).unwrap(),
        deleted_at: None,
    }
}

/// Filters its patients by reminder date the way the real store does and
/// records every date it was queried for.
pub struct TestPatientQuery {
    patients: Vec<Patient>,
    failures_left: AtomicUsize,
    queried: Mutex<Vec<NaiveDate>>,
}

impl TestPatientQuery {
    pub fn new(patients: Vec<Patient>) -> Self {
        Self {
            patients,
            failures_left: AtomicUsize::new(0),
            queried: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_first(patients: Vec<Patient>, failures: usize) -> Self {
        let query = Self::new(patients);
        query.failures_left.store(failures, Ordering::SeqCst);
        query
    }

    pub fn queried_dates(&self) -> Vec<NaiveDate> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait]
impl PatientReminderQuery for TestPatientQuery {
    async fn find_patients_with_reminder_on(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<Patient>, StorageError> {
        self.queried.lock().unwrap().push(date);

        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failed {
            return Err(StorageError::Sqlx(sqlx::Error::PoolTimedOut));
        }

        Ok(self
            .patients
            .iter()
            .filter(|patient| patient.reminder_dates.contains(date))
            .cloned()
            .collect())
    }
}

pub type SentMessages = Arc<Mutex<Vec<EmailMessage>>>;

/// Records sent messages; recipients listed in `failing` are rejected.
#[derive(Clone, Default)]
pub struct TestEmailSender {
    pub sent: SentMessages,
    failing: Arc<HashSet<String>>,
    gate: Option<Arc<Notify>>,
}

impl TestEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(recipients: &[&str]) -> Self {
        Self {
            failing: Arc::new(recipients.iter().map(|r| r.to_string()).collect()),
            ..Self::default()
        }
    }

    /// Every send waits until the returned gate is notified.
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let sender = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (sender, gate)
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|message| message.to().to_owned())
            .collect()
    }
}

#[async_trait]
impl EmailSender for TestEmailSender {
    async fn send_email(&self, message: &EmailMessage) -> Result<(), EmailError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        if self.failing.contains(message.to()) {
            return Err(EmailError::Rejected {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                body: "invalid recipient".to_owned(),
            });
        }

        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Wall clock that advances with tokio's (possibly paused) clock.
pub struct VirtualClock {
    start: DateTime<Utc>,
    started_at: tokio::time::Instant,
}

impl VirtualClock {
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            start,
            started_at: tokio::time::Instant::now(),
        }
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> DateTime<Utc> {
        self.start + TimeDelta::from_std(self.started_at.elapsed()).unwrap()
    }
}

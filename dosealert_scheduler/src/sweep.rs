use std::{fmt, sync::Arc};

use dosealert_email::{EmailError, EmailSender};
use dosealert_models::{
    chrono::NaiveDate,
    notification::Role,
    patient::{Patient, PatientId},
};
use dosealert_storage::{NotificationFeed, PatientReminderQuery, StorageError};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::ReminderEmailTemplate;

#[derive(Debug, Error)]
#[error("failed to send reminder to patient {patient_id} <{recipient}>")]
pub struct EmailDispatchError {
    pub patient_id: PatientId,
    pub recipient: String,
    #[source]
    pub source: EmailError,
}

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("patient store query for reminders due on {date} failed")]
    StoreQuery {
        date: NaiveDate,
        #[source]
        source: StorageError,
    },

    #[error("a reminder sweep is already in progress")]
    AlreadyRunning,
}

/// Outcome of one sweep run.
#[derive(Debug)]
pub struct SweepSummary {
    pub date: NaiveDate,
    pub matched: usize,
    pub sent: usize,
    pub failures: Vec<EmailDispatchError>,
    pub cancelled: bool,
}

impl SweepSummary {
    fn new(date: NaiveDate, matched: usize) -> Self {
        Self {
            date,
            matched,
            sent: 0,
            failures: Vec::new(),
            cancelled: false,
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Matched patients that were never attempted because the run was cancelled.
    pub fn skipped(&self) -> usize {
        self.matched - self.sent - self.failed()
    }
}

impl fmt::Display for SweepSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reminder sweep for {}: {} matched, {} sent, {} failed",
            self.date,
            self.matched,
            self.sent,
            self.failed()
        )?;
        if self.cancelled {
            write!(f, ", cancelled with {} not attempted", self.skipped())?;
        }
        Ok(())
    }
}

/// Finds every patient with a reminder due on a date and emails each one.
pub struct ReminderSweep {
    patients: Arc<dyn PatientReminderQuery>,
    email: Arc<dyn EmailSender>,
    template: ReminderEmailTemplate,
    notifications: Option<Arc<NotificationFeed>>,
    in_progress: Mutex<()>,
}

impl ReminderSweep {
    pub fn new(
        patients: Arc<dyn PatientReminderQuery>,
        email: Arc<dyn EmailSender>,
        template: ReminderEmailTemplate,
    ) -> Self {
        Self {
            patients,
            email,
            template,
            notifications: None,
            in_progress: Mutex::new(()),
        }
    }

    /// Publish each run's outcome to super admins.
    pub fn with_notifications(mut self, feed: Arc<NotificationFeed>) -> Self {
        self.notifications = Some(feed);
        self
    }

    pub async fn run(
        &self,
        today: NaiveDate,
        cancellation: &CancellationToken,
    ) -> Result<SweepSummary, SweepError> {
        let Ok(_running) = self.in_progress.try_lock() else {
            log::warn!("Skipping reminder sweep for {today}: previous sweep still running");
            return Err(SweepError::AlreadyRunning);
        };

        log::info!("Checking for reminders due on {today}");

        let patients = match self.patients.find_patients_with_reminder_on(today).await {
            Ok(patients) => patients,
            Err(source) => {
                log::error!("Error fetching patients with reminders on {today}: {source}");
                self.notify(format!("Reminder sweep for {today} failed: {source}"))
                    .await;
                return Err(SweepError::StoreQuery {
                    date: today,
                    source,
                });
            }
        };

        let mut summary = SweepSummary::new(today, patients.len());
        for patient in &patients {
            let outcome = tokio::select! {
                biased;
                _ = cancellation.cancelled() => None,
                outcome = self.dispatch(patient) => Some(outcome),
            };

            match outcome {
                Some(Ok(())) => summary.sent += 1,
                Some(Err(error)) => {
                    log::warn!("{error}: {}", error.source);
                    summary.failures.push(error);
                }
                None => {
                    summary.cancelled = true;
                    break;
                }
            }
        }

        log::info!("{summary}");
        self.notify(summary.to_string()).await;

        Ok(summary)
    }

    async fn dispatch(&self, patient: &Patient) -> Result<(), EmailDispatchError> {
        let dispatch_error = |source| EmailDispatchError {
            patient_id: patient.id,
            recipient: patient.email.clone(),
            source,
        };

        let message = self.template.render(patient).map_err(dispatch_error)?;
        self.email
            .send_email(&message)
            .await
            .map_err(dispatch_error)?;

        log::info!(
            "Reminder email sent to {} for dose due on {}",
            patient.email,
            patient.next_dose_date
        );
        Ok(())
    }

    async fn notify(&self, message: String) {
        if let Some(feed) = &self.notifications {
            feed.publish(Role::SuperAdmin, message).await;
        }
    }
}

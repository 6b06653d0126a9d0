use dosealert_email::{EmailError, EmailMessage};
use dosealert_models::{patient::Patient, reminder_dates::format_calendar_date};

#[derive(Debug, Clone)]
pub struct ReminderEmailTemplate {
    pharmacy_name: String,
}

impl ReminderEmailTemplate {
    pub fn new(pharmacy_name: impl Into<String>) -> Self {
        Self {
            pharmacy_name: pharmacy_name.into(),
        }
    }

    pub fn render(&self, patient: &Patient) -> Result<EmailMessage, EmailError> {
        let due_on = format_calendar_date(patient.next_dose_date);
        let subject = format!("Reminder: Your Next Dose is Due on {due_on}");
        let body = format!(
            "Hi {name},\n\n\
             This is a reminder that your next dose of {drug} ({category}) is due on {due_on}.\n\n\
             Please ensure you take your medication on time.\n\n\
             Best regards,\n\
             {pharmacy}",
            name = patient.full_name(),
            drug = patient.drug,
            category = patient.drug_category,
            pharmacy = self.pharmacy_name,
        );

        EmailMessage::new(&patient.email, subject, body)
    }
}

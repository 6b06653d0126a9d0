mod resend;

use async_trait::async_trait;
use thiserror::Error;

pub use reqwest::StatusCode;
pub use resend::ResendEmailSender;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("email provider rejected the message ({status}): {body}")]
    Rejected {
        status: StatusCode,
        body: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    to: String,
    subject: String,
    body: String,
}

impl EmailMessage {
    pub fn new(
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self, EmailError> {
        let message = Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        };

        for (name, value) in [
            ("to", &message.to),
            ("subject", &message.subject),
            ("body", &message.body),
        ] {
            if value.trim().is_empty() {
                return Err(EmailError::MissingField(name));
            }
        }

        Ok(message)
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

#[async_trait]
pub trait EmailSender: Send + Sync + 'static {
    async fn send_email(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

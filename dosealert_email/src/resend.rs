use std::time::Duration;

use async_trait::async_trait;
use dosealert_models::settings::EmailSettings;
use serde::Serialize;

use crate::{EmailError, EmailMessage, EmailSender};

/// Sends email through the Resend HTTP API.
pub struct ResendEmailSender {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct ResendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: String,
}

impl ResendEmailSender {
    pub fn new(settings: &EmailSettings) -> Result<Self, EmailError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
            from: settings.from.clone(),
        })
    }

    fn request<'a>(&'a self, message: &'a EmailMessage) -> ResendEmailRequest<'a> {
        ResendEmailRequest {
            from: &self.from,
            to: message.to(),
            subject: message.subject(),
            html: to_html(message.body()),
        }
    }
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    async fn send_email(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request(message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Rejected { status, body });
        }

        log::info!("Email sent successfully to {}", message.to());
        Ok(())
    }
}

fn to_html(body: &str) -> String {
    let mut escaped = String::with_capacity(body.len());
    for c in body.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '\n' => escaped.push_str("<br>"),
            c => escaped.push(c),
        }
    }

    format!("<p>{escaped}</p>")
}

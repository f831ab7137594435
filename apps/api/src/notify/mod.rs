//! Notification Service: plain-text email through the SendGrid v3 Web API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

const SENDGRID_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("SendGrid API key is invalid: keys start with \"SG.\"")]
    InvalidApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("SendGrid returned status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Carried in `AppState` as `Arc<dyn Notifier>`.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, body: &str)
        -> Result<(), NotificationError>;
}

#[derive(Debug, Serialize)]
struct MailSend<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

#[derive(Clone)]
pub struct SendGridNotifier {
    client: Client,
    api_key: String,
    sender: String,
}

impl SendGridNotifier {
    pub fn new(client: Client, api_key: String, sender: String) -> Self {
        Self {
            client,
            api_key,
            sender,
        }
    }
}

fn mail_body<'a>(from: &'a str, to: &'a str, subject: &'a str, body: &'a str) -> MailSend<'a> {
    MailSend {
        personalizations: [Personalization {
            to: [Address { email: to }],
        }],
        from: Address { email: from },
        subject,
        content: [Content {
            content_type: "text/plain",
            value: body,
        }],
    }
}

#[async_trait]
impl Notifier for SendGridNotifier {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotificationError> {
        if !self.api_key.starts_with("SG.") {
            return Err(NotificationError::InvalidApiKey);
        }

        let response = self
            .client
            .post(SENDGRID_API_URL)
            .bearer_auth(&self.api_key)
            .json(&mail_body(&self.sender, to, subject, body))
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::ACCEPTED {
            let body = response.text().await.unwrap_or_default();
            warn!("SendGrid rejected email to {to}: {status} {body}");
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!("Email sent to {to}: {subject}");
        Ok(())
    }
}

//! Outbound email. Production traffic goes through the SendGrid v3 API;
//! without an API key the server falls back to logging messages, which keeps
//! local development working without credentials.

pub mod templates;

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("email provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("email provider rejected the message: {status}")]
    Rejected { status: reqwest::StatusCode },
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailerError>;
}

/// SendGrid-backed mailer.
pub struct SendGridMailer {
    client: reqwest::Client,
    api_key: String,
    from_email: String,
}

impl fmt::Debug for SendGridMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendGridMailer")
            .field("from_email", &self.from_email)
            .finish_non_exhaustive()
    }
}

impl SendGridMailer {
    pub fn new(api_key: String, from_email: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key,
            from_email,
        }
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailerError> {
        let payload = serde_json::json!({
            "personalizations": [{ "to": [{ "email": email.to }] }],
            "from": { "email": self.from_email },
            "subject": email.subject,
            "content": [{ "type": "text/plain", "value": email.body }],
        });

        let response = self
            .client
            .post(SENDGRID_SEND_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "sendgrid rejected outbound email");
            return Err(MailerError::Rejected { status });
        }

        tracing::debug!(subject = %email.subject, "outbound email accepted");
        Ok(())
    }
}

/// Logs messages instead of delivering them. Used when no SendGrid API key
/// is configured.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailerError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            body = %email.body,
            "email delivery disabled; logging message instead"
        );
        Ok(())
    }
}

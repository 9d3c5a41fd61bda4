use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, instrument};

/// A single outbound email.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Mail transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Mail rejected: {0}")]
    Rejected(String),
}

/// Best-effort email delivery. Callers decide whether to await a send or
/// detach it; implementations never retry.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError>;
}

/// Used when no mail credentials are configured: records the would-be send
/// in the log and reports success.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        info!(to = %message.to, subject = %message.subject, "Email credentials not configured, simulating send");
        Ok(())
    }
}

#[derive(Serialize)]
struct MailApiRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

/// Sends through a Resend-compatible HTTP mail API using a bearer key.
pub struct HttpMailNotifier {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailNotifier {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Notifier for HttpMailNotifier {
    #[instrument(name = "send_email", skip(self, message), fields(to = %message.to))]
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&MailApiRequest {
                from: &self.from,
                to: [&message.to],
                subject: &message.subject,
                html: &message.html,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected(format!("{status}: {body}")));
        }
        info!("Email sent successfully");
        Ok(())
    }
}

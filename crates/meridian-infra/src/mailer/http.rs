//! HTTP mailer - relays messages to a transactional email API.

use async_trait::async_trait;
use serde::Serialize;

use meridian_core::ports::{Mailer, MailerError, OutboundEmail};

/// Email relay configuration.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// Send endpoint of the email API.
    pub api_url: String,
    /// Bearer key for the email API.
    pub api_key: String,
    /// Verified sender address.
    pub from: String,
}

impl MailerConfig {
    /// Load from environment. Returns `None` when no API key is configured,
    /// in which case callers fall back to the in-memory mailer.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("MAILER_API_KEY").ok()?;
        Some(Self {
            api_url: std::env::var("MAILER_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com/emails".to_string()),
            api_key,
            from: std::env::var("MAILER_FROM")
                .unwrap_or_else(|_| "enquiries@meridianadmissions.co.uk".to_string()),
        })
    }
}

#[derive(Serialize)]
struct SendPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

/// Mailer posting JSON to the configured email API.
pub struct HttpMailer {
    client: reqwest::Client,
    config: MailerConfig,
}

impl HttpMailer {
    pub fn new(config: MailerConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailerError> {
        let payload = SendPayload {
            from: &self.config.from,
            to: &email.to,
            subject: &email.subject,
            text: &email.text,
            reply_to: email.reply_to.as_deref(),
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MailerError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(MailerError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        tracing::debug!(to = %email.to, subject = %email.subject, "Email relayed");
        Ok(())
    }
}

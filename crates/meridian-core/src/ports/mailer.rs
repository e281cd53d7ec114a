//! Outbound email port.

use async_trait::async_trait;

/// A single message handed to the email relay.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    /// Reply-To, so the consultancy inbox can answer the enquirer directly.
    pub reply_to: Option<String>,
}

impl OutboundEmail {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            text: text.into(),
            reply_to: None,
        }
    }

    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }
}

/// Mailer trait - abstraction over the transactional email service.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailerError>;
}

/// Mailer errors.
#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("Email API rejected the message: status {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("Could not reach email API: {0}")]
    Transport(String),
}

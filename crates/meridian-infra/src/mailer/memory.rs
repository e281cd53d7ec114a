//! In-memory mailer - used when no email API key is configured.
//!
//! Messages are logged and recorded instead of sent, which keeps local
//! development and tests independent of the relay.

use std::sync::Mutex;

use async_trait::async_trait;

use meridian_core::ports::{Mailer, MailerError, OutboundEmail};

#[derive(Default)]
pub struct InMemoryMailer {
    sent: Mutex<Vec<OutboundEmail>>,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages recorded so far.
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailerError> {
        tracing::info!(to = %email.to, subject = %email.subject, "Email captured (no relay configured)");
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_sent_mail() {
        let mailer = InMemoryMailer::new();
        let email = OutboundEmail::new("team@example.com", "New enquiry", "body")
            .with_reply_to("student@example.com");

        mailer.send(&email).await.unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "team@example.com");
        assert_eq!(sent[0].reply_to.as_deref(), Some("student@example.com"));
    }
}

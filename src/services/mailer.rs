//! Outbound email seam.
//!
//! The crate never talks SMTP itself; callers install whatever transport
//! they need behind the `Mailer` trait. `NoopMailer` drops mail on the
//! floor (logging it), `MemoryMailer` keeps an outbox for tests and dev.

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Mail delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), MailerError>;
}

/// Discards all mail. The default when no transport is configured.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, email: Email) -> Result<(), MailerError> {
        tracing::debug!(to = %email.to, subject = %email.subject, "Dropping email (no mailer configured)");
        Ok(())
    }
}

/// Collects sent mail in memory.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<Email>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outbox(&self) -> Vec<Email> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: Email) -> Result<(), MailerError> {
        self.sent
            .lock()
            .map_err(|_| MailerError::Delivery("outbox poisoned".to_string()))?
            .push(email);
        Ok(())
    }
}

//! Outbound mail for sharebox.
//!
//! Delivery goes through the [`MailSender`] trait so the SMTP transport can
//! be swapped for a logging or in-memory sender. Mail is best effort:
//! callers use [`send_best_effort`], which logs failures instead of
//! propagating them.

mod smtp;

pub use smtp::SmtpMailer;

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{error, info};

use crate::Result;

/// Subject of the verification mail.
pub const VERIFICATION_SUBJECT: &str = "Verify Your Email";

/// A plain-text message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingMail {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Something that can deliver an [`OutgoingMail`].
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<()>;
}

/// Build the verification mail for `token`.
///
/// The link points at `{backend_url}/api/email/verify/{token}/`.
pub fn verification_mail(to: &str, token: &str, backend_url: &str) -> OutgoingMail {
    let link = format!(
        "{}/api/email/verify/{}/",
        backend_url.trim_end_matches('/'),
        token
    );
    OutgoingMail::new(
        to,
        VERIFICATION_SUBJECT,
        format!("Click the link to verify your email: {link}"),
    )
}

/// Send `mail`, logging instead of failing. Returns whether delivery succeeded.
pub async fn send_best_effort(sender: &dyn MailSender, mail: &OutgoingMail) -> bool {
    match sender.send(mail).await {
        Ok(()) => {
            info!(to = %mail.to, subject = %mail.subject, "Mail sent");
            true
        }
        Err(e) => {
            error!(error = %e, to = %mail.to, subject = %mail.subject, "Failed to send mail");
            false
        }
    }
}

/// Sender that only writes mails to the log. Used when SMTP is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl MailSender for LogMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        info!(to = %mail.to, subject = %mail.subject, body = %mail.body, "Mail delivery disabled; logging message");
        Ok(())
    }
}

/// Sender that keeps every mail in memory.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All mails sent so far, oldest first.
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Most recent mail addressed to `to`.
    pub fn last_to(&self, to: &str) -> Option<OutgoingMail> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }
}

#[async_trait]
impl MailSender for MemoryMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(mail.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ShareboxError;

    struct FailingMailer;

    #[async_trait]
    impl MailSender for FailingMailer {
        async fn send(&self, _mail: &OutgoingMail) -> Result<()> {
            Err(ShareboxError::Mail("connection refused".to_string()))
        }
    }

    #[test]
    fn test_verification_mail() {
        let mail = verification_mail("c@example.com", "abc-123", "http://localhost:8000/");
        assert_eq!(mail.to, "c@example.com");
        assert_eq!(mail.subject, "Verify Your Email");
        assert_eq!(
            mail.body,
            "Click the link to verify your email: http://localhost:8000/api/email/verify/abc-123/"
        );
    }

    #[tokio::test]
    async fn test_memory_mailer_records() {
        let mailer = MemoryMailer::new();
        assert!(send_best_effort(&mailer, &OutgoingMail::new("a@x.io", "one", "1")).await);
        assert!(send_best_effort(&mailer, &OutgoingMail::new("b@x.io", "two", "2")).await);
        assert!(send_best_effort(&mailer, &OutgoingMail::new("a@x.io", "three", "3")).await);

        assert_eq!(mailer.sent().len(), 3);
        assert_eq!(mailer.last_to("a@x.io").unwrap().subject, "three");
        assert!(mailer.last_to("c@x.io").is_none());
    }

    #[tokio::test]
    async fn test_best_effort_swallows_failure() {
        let delivered = send_best_effort(&FailingMailer, &OutgoingMail::new("a@x.io", "s", "b")).await;
        assert!(!delivered);
    }

    #[tokio::test]
    async fn test_log_mailer_succeeds() {
        assert!(LogMailer.send(&OutgoingMail::new("a@x.io", "s", "b")).await.is_ok());
    }
}

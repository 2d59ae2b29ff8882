//! Mail transport: authenticated SMTP submission with STARTTLS.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

const SMTP_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MailError {
    /// Connection refused, login rejected, timeout: worth another attempt.
    #[error("mail transport error: {0}")]
    Transport(String),

    /// The message itself is malformed; resending cannot help.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

/// Delivers one plain-text email.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}

/// SMTP relay client. Connections are opened per send.
pub struct SmtpMailer {
    from: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self {
            from: config.smtp_username.clone(),
            transport,
        })
    }

    fn build_message(&self, email: &Email) -> Result<Message, MailError> {
        let from: Mailbox = self
            .from
            .parse()
            .map_err(|e| MailError::InvalidMessage(format!("sender '{}': {e}", self.from)))?;
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| MailError::InvalidMessage(format!("recipient '{}': {e}", email.to)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| MailError::InvalidMessage(e.to_string()))
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let message = self.build_message(email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        debug!("SMTP relay accepted message for {}", email.to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mailer() -> SmtpMailer {
        SmtpMailer::from_config(&Config::for_tests()).unwrap()
    }

    #[test]
    fn test_build_message_accepts_plain_addresses() {
        let email = Email {
            to: "candidate@example.com".to_string(),
            subject: "Interview Schedule".to_string(),
            body: "See you soon".to_string(),
        };
        assert!(mailer().build_message(&email).is_ok());
    }

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        let email = Email {
            to: "not an address".to_string(),
            subject: "s".to_string(),
            body: "b".to_string(),
        };
        let err = mailer().build_message(&email).unwrap_err();
        assert!(matches!(err, MailError::InvalidMessage(_)));
    }
}

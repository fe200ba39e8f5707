//! SMTP email channel.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use tracing::info;

use super::{DeliveryReceipt, Transport};
use crate::core::config::SmtpConfig;
use crate::errors::{AppError, AppResult};

/// Subject line used for conversation replies; invitations and other
/// one-off mails pass their own subject to [`Mailer::send`].
const REPLY_SUBJECT: &str = "New reply from the shop";

pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Mailer {
    /// # Errors
    ///
    /// Returns an error when the relay host is unusable or the configured
    /// from-address does not parse.
    pub fn new(config: &SmtpConfig) -> AppResult<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| email_error(None, format!("smtp relay setup failed: {e}")))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        let from = config
            .from_address
            .parse::<Mailbox>()
            .map_err(|e| email_error(None, format!("invalid SMTP_FROM address: {e}")))?;
        Ok(Self { transport, from })
    }

    /// Sends a plain-text email.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Channel`] when the address does not parse or
    /// the relay rejects the message.
    pub async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<DeliveryReceipt> {
        let to_mailbox = to
            .parse::<Mailbox>()
            .map_err(|e| email_error(Some("invalid_address"), format!("invalid recipient {to}: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| email_error(None, format!("failed to build message: {e}")))?;

        self.transport.send(message).await.map_err(|e| {
            let code = if e.is_permanent() {
                Some("permanent")
            } else if e.is_transient() {
                Some("transient")
            } else {
                None
            };
            email_error(code, e.to_string())
        })?;

        info!(to = %to, "email sent");
        // SMTP has no provider-side message id worth persisting.
        Ok(DeliveryReceipt::default())
    }
}

fn email_error(code: Option<&str>, message: impl Into<String>) -> AppError {
    AppError::Channel {
        channel: "email",
        code: code.map(ToString::to_string),
        message: message.into(),
    }
}

pub(super) struct EmailTransport {
    mailer: Arc<Mailer>,
}

impl EmailTransport {
    pub(super) fn new(mailer: Arc<Mailer>) -> Self {
        Self { mailer }
    }
}

#[async_trait]
impl Transport for EmailTransport {
    async fn send_text(&self, to: &str, body: &str) -> AppResult<DeliveryReceipt> {
        self.mailer.send(to, REPLY_SUBJECT, body).await
    }
}

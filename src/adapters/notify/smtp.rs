//! SMTP Notifier - Alert Email Delivery
//!
//! Sends each alert event as one plain-text email per recipient over
//! an authenticated STARTTLS submission channel (app-password auth).

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, instrument};

use super::message::{AlertMessage, MessageComposer};
use crate::config::NotifyConfig;
use crate::domain::alert::AlertEvent;
use crate::ports::notification::{NotificationSink, Recipient};

/// Email notification sink.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    recipients: Vec<Recipient>,
    composer: MessageComposer,
}

impl SmtpNotifier {
    /// Build the notifier with a pooled STARTTLS transport.
    pub fn new(
        config: &NotifyConfig,
        sender: &str,
        app_password: &str,
        composer: MessageComposer,
    ) -> Result<Self> {
        let sender_mailbox: Mailbox = sender
            .parse()
            .with_context(|| format!("Invalid sender address {sender:?}"))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .with_context(|| format!("Invalid SMTP relay {}", config.smtp_host))?
            .port(config.smtp_port)
            .credentials(Credentials::new(sender.to_string(), app_password.to_string()))
            .timeout(Some(Duration::from_millis(config.timeout_ms)))
            .build();

        Ok(Self {
            transport,
            sender: sender_mailbox,
            recipients: config.recipients.clone(),
            composer,
        })
    }

    /// Build the MIME message for one recipient.
    pub fn build_email(
        sender: &Mailbox,
        recipient: &Recipient,
        message: &AlertMessage,
    ) -> Result<Message> {
        let to: Mailbox = recipient
            .as_str()
            .parse()
            .with_context(|| format!("Invalid recipient address {recipient}"))?;

        Message::builder()
            .from(sender.clone())
            .to(to)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .context("Failed to build alert email")
    }
}

#[async_trait]
impl NotificationSink for SmtpNotifier {
    fn recipients(&self) -> Vec<Recipient> {
        self.recipients.clone()
    }

    #[instrument(skip(self, event), fields(seq = event.sequence_no, kind = %event.kind))]
    async fn send(&self, event: &AlertEvent, recipient: &Recipient) -> Result<()> {
        let message = self.composer.compose(event);
        let email = Self::build_email(&self.sender, recipient, &message)?;

        self.transport
            .send(email)
            .await
            .with_context(|| format!("SMTP delivery to {recipient} failed"))?;

        info!(%recipient, subject = %message.subject, "Alert email sent");
        Ok(())
    }
}

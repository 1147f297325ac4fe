//! Outbound email for approved requests.
//!
//! `SmtpNotifier` talks to a real relay; `ConsoleNotifier` only logs and is what
//! development setups without relay credentials get.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MailAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

use crate::config::{MailConfig, SmtpConfig};

/// Binary payload attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: mime::Mime,
    pub content: Vec<u8>,
}

impl Attachment {
    pub fn pdf(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: mime::APPLICATION_PDF,
            content,
        }
    }
}

/// A single outbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<Attachment>,
}

/// Trait describing outbound mail hooks so the service can run against doubles.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Resolves once the relay accepted or refused the message. No retries.
    async fn send(&self, notification: Notification) -> Result<(), DeliveryError>;
}

/// Mail dispatch error; carries the underlying cause as text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("invalid email address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("failed to build message: {0}")]
    Message(String),
    #[error("mail transport failed: {0}")]
    Transport(String),
}

/// Async SMTP relay client using STARTTLS on the submission port.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpNotifier {
    pub fn from_config(config: &SmtpConfig) -> Result<Self, DeliveryError> {
        let sender = parse_mailbox(&config.sender)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|err| DeliveryError::Transport(err.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { transport, sender })
    }

    fn build_message(&self, notification: Notification) -> Result<Message, DeliveryError> {
        let recipient = parse_mailbox(&notification.recipient)?;
        let builder = Message::builder()
            .from(self.sender.clone())
            .to(recipient)
            .subject(notification.subject);

        let message = match notification.attachment {
            Some(attachment) => {
                let content_type = ContentType::parse(attachment.content_type.as_ref())
                    .map_err(|err| DeliveryError::Message(err.to_string()))?;
                let part = MailAttachment::new(attachment.filename)
                    .body(attachment.content, content_type);
                builder.multipart(
                    MultiPart::mixed()
                        .singlepart(SinglePart::plain(notification.body))
                        .singlepart(part),
                )
            }
            None => builder.singlepart(SinglePart::plain(notification.body)),
        };

        message.map_err(|err| DeliveryError::Message(err.to_string()))
    }
}

#[async_trait]
impl NotificationSender for SmtpNotifier {
    async fn send(&self, notification: Notification) -> Result<(), DeliveryError> {
        let recipient = notification.recipient.clone();
        let message = self.build_message(notification)?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;

        debug!(%recipient, code = %response.code(), "relay accepted message");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address
        .parse::<Mailbox>()
        .map_err(|err| DeliveryError::InvalidAddress {
            address: address.to_string(),
            reason: err.to_string(),
        })
}

/// Logs messages instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct ConsoleNotifier;

#[async_trait]
impl NotificationSender for ConsoleNotifier {
    async fn send(&self, notification: Notification) -> Result<(), DeliveryError> {
        let attachment = notification
            .attachment
            .as_ref()
            .map(|attachment| attachment.filename.as_str());
        let attachment_bytes = notification
            .attachment
            .as_ref()
            .map_or(0, |attachment| attachment.content.len());

        info!(
            recipient = %notification.recipient,
            subject = %notification.subject,
            attachment = attachment.unwrap_or("-"),
            attachment_bytes,
            "console mail transport: message not sent"
        );
        Ok(())
    }
}

/// Transport chosen from configuration at startup.
pub enum ConfiguredNotifier {
    Smtp(SmtpNotifier),
    Console(ConsoleNotifier),
}

impl ConfiguredNotifier {
    pub fn from_config(config: &MailConfig) -> Result<Self, DeliveryError> {
        match config {
            MailConfig::Smtp(smtp) => Ok(Self::Smtp(SmtpNotifier::from_config(smtp)?)),
            MailConfig::Console => Ok(Self::Console(ConsoleNotifier)),
        }
    }

    pub fn transport_name(&self) -> &'static str {
        match self {
            ConfiguredNotifier::Smtp(_) => "smtp",
            ConfiguredNotifier::Console(_) => "console",
        }
    }
}

#[async_trait]
impl NotificationSender for ConfiguredNotifier {
    async fn send(&self, notification: Notification) -> Result<(), DeliveryError> {
        match self {
            ConfiguredNotifier::Smtp(notifier) => notifier.send(notification).await,
            ConfiguredNotifier::Console(notifier) => notifier.send(notification).await,
        }
    }
}

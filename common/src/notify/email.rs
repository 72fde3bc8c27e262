// SMTP mailer (STARTTLS relay, plain-text bodies)

use super::Mailer;
use crate::config::EmailConfig;
use crate::errors::DeliveryError;
use crate::models::EmailMessage;
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, instrument};

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self, DeliveryError> {
        let address = config
            .from
            .trim()
            .parse::<Address>()
            .map_err(|e| DeliveryError::InvalidAddress {
                address: config.from.clone(),
                reason: e.to_string(),
            })?;
        // Display names may carry commas or colons; Mailbox quotes them on output
        let name = Some(config.sender_name.trim().to_string()).filter(|n| !n.is_empty());
        let from = Mailbox::new(name, address);

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| DeliveryError::Transport(format!("SMTP relay: {}", e)))?
            .port(config.smtp_port);

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    /// Build the lettre message without sending it
    pub fn build_message(&self, message: &EmailMessage) -> Result<Message, DeliveryError> {
        if message.recipients.is_empty() {
            return Err(DeliveryError::MessageBuild("no recipients".to_string()));
        }

        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN);

        for recipient in &message.recipients {
            builder = builder.to(parse_mailbox(recipient)?);
        }

        builder
            .body(message.body.clone())
            .map_err(|e| DeliveryError::MessageBuild(e.to_string()))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address
        .trim()
        .parse()
        .map_err(|e: lettre::address::AddressError| DeliveryError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[instrument(skip(self, message), fields(subject = %message.subject))]
    async fn send(&self, message: &EmailMessage) -> Result<(), DeliveryError> {
        let email = self.build_message(message)?;

        self.transport
            .send(email)
            .await
            .map_err(|e| DeliveryError::Transport(format!("SMTP send: {}", e)))?;

        debug!(recipients = message.recipients.len(), "Email handed to relay");
        Ok(())
    }
}

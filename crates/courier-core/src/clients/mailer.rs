//! SMTP email delivery via lettre

use crate::config::SmtpConfig;
use crate::error::{CourierError, Result};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::collections::BTreeSet;

pub struct MailClient {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl MailClient {
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| CourierError::Delivery(format!("Invalid SMTP relay: {}", e)))?
            .port(config.port)
            .credentials(credentials)
            .build();

        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_address)
            .parse()
            .map_err(|e| {
                CourierError::Config(format!(
                    "Invalid sender address '{}': {}",
                    config.from_address, e
                ))
            })?;

        Ok(Self { mailer, from })
    }

    /// Send a plain-text email to every recipient in one message
    pub async fn deliver(
        &self,
        recipients: &BTreeSet<String>,
        subject: &str,
        body: &str,
    ) -> Result<()> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);

        for recipient in recipients {
            let mailbox: Mailbox = recipient.parse().map_err(|e| {
                CourierError::Delivery(format!("Invalid recipient address '{}': {}", recipient, e))
            })?;
            builder = builder.to(mailbox);
        }

        let message = builder
            .body(body.to_string())
            .map_err(|e| CourierError::Delivery(format!("Failed to build message: {}", e)))?;

        self.mailer
            .send(message)
            .await
            .map_err(|e| CourierError::Delivery(format!("SMTP send failed: {}", e)))?;

        log::info!("Delivered email to {} recipients", recipients.len());
        Ok(())
    }
}

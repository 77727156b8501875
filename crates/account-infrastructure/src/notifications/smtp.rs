//! SMTP delivery through lettre's async transport.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use account_core::notifications::{MailTransport, TransportError};
use account_shared::config::SmtpSettings;

pub struct SmtpMailTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

fn parse_mailbox(address: &str) -> Result<Mailbox, TransportError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| TransportError::Other(Box::new(e)))
}

/// Server replies are protocol failures; everything else (DNS, TCP, TLS,
/// timeouts) means the server could not be reached.
fn classify(e: lettre::transport::smtp::Error) -> TransportError {
    if e.is_response() || e.is_transient() || e.is_permanent() {
        TransportError::Protocol(e.to_string())
    } else {
        TransportError::Connection(e.to_string())
    }
}

impl SmtpMailTransport {
    pub fn new(settings: &SmtpSettings) -> Result<Self, TransportError> {
        let builder = if settings.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
        }
        .map_err(|e| TransportError::Connection(e.to_string()))?;

        let mailer = builder
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();

        Ok(Self {
            mailer,
            from: parse_mailbox(&settings.from_address)?,
        })
    }
}

fn build_message(from: &Mailbox, subject: &str, html: &str, recipient: &str) -> Result<Message, TransportError> {
    Message::builder()
        .from(from.clone())
        .to(parse_mailbox(recipient)?)
        .subject(subject)
        .header(ContentType::TEXT_HTML)
        .body(html.to_string())
        .map_err(|e| TransportError::Other(Box::new(e)))
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, subject: &str, html: &str, recipient: &str) -> Result<(), TransportError> {
        let message = build_message(&self.from, subject, html, recipient)?;
        let response = self.mailer.send(message).await.map_err(classify)?;
        debug!("SMTP accepted message: {:?}", response.code());
        Ok(())
    }
}

//! Rendering and delivery ports

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{NotificationKind, TemplateFields};

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Missing template variable: {0}")]
    MissingVariable(String),

    #[error("Template render failed: {0}")]
    Render(String),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Mail server unreachable: {0}")]
    Connection(String),

    #[error("Mail server rejected message: {0}")]
    Protocol(String),

    #[error("Transport failure: {0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Produces the HTML body for a notification kind.
#[cfg_attr(test, mockall::automock)]
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, kind: NotificationKind, fields: &TemplateFields) -> Result<String, TemplateError>;
}

/// Delivers one rendered message to one recipient.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, subject: &str, html: &str, recipient: &str) -> Result<(), TransportError>;
}

//! Notification adapters: markdown templates and SMTP delivery.

pub mod smtp;
pub mod templates;

pub use smtp::SmtpMailTransport;
pub use templates::MarkdownTemplateProvider;

//! Notification gateway
//!
//! Turns account events into rendered messages and hands them to a mail
//! transport. Rendering and delivery are ports so the gateway can be driven
//! by mocks in tests and by real adapters in infrastructure.

pub mod email_service;
pub mod notifier;
pub mod ports;

pub use email_service::{EmailService, NotificationError};
pub use notifier::AccountNotifier;
pub use ports::{MailTransport, TemplateError, TemplateRenderer, TransportError};

#[cfg(test)]
pub use notifier::MockAccountNotifier;
#[cfg(test)]
pub use ports::{MockMailTransport, MockTemplateRenderer};

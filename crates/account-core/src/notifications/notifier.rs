//! Account-event notifier used by the state manager.

use async_trait::async_trait;

use super::email_service::{base_fields, EmailService, NotificationError};
use super::ports::{MailTransport, TemplateRenderer};
use crate::domain::{NotificationKind, User};

/// What the state manager needs from the gateway, one method per event.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountNotifier: Send + Sync {
    async fn send_verification(&self, user: &User) -> Result<(), NotificationError>;
    async fn send_account_locked(&self, user: &User) -> Result<(), NotificationError>;
    async fn send_password_reset(&self, user: &User) -> Result<(), NotificationError>;
}

#[async_trait]
impl<R: TemplateRenderer, T: MailTransport> AccountNotifier for EmailService<R, T> {
    async fn send_verification(&self, user: &User) -> Result<(), NotificationError> {
        EmailService::send_verification(self, user).await
    }

    async fn send_account_locked(&self, user: &User) -> Result<(), NotificationError> {
        self.send(NotificationKind::AccountLocked.as_str(), &base_fields(user))
            .await
    }

    async fn send_password_reset(&self, user: &User) -> Result<(), NotificationError> {
        self.send(NotificationKind::PasswordReset.as_str(), &base_fields(user))
            .await
    }
}

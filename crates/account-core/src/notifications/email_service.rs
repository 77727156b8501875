// ============================================================================
// Account Core - Email Service
// File: crates/account-core/src/notifications/email_service.rs
// ============================================================================
//! Validates, renders and dispatches account notifications.
//!
//! Every failure is classified: bad input is rejected before the renderer
//! runs, a render failure never reaches the transport, and transport
//! failures are reported apart from both.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use account_shared::utils::mask_email;

use super::ports::{MailTransport, TemplateError, TemplateRenderer, TransportError};
use crate::domain::{
    NotificationKind, NotificationRequest, TemplateFields, UnknownNotificationKind, User,
};
use crate::validation::is_valid_email_address;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Invalid notification input: {0}")]
    InvalidInput(String),

    #[error("Notification content error: {0}")]
    Content(#[source] TemplateError),

    #[error("Notification transport error: {0}")]
    Transport(String),

    #[error("Unexpected notification failure: {0}")]
    Unexpected(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub struct EmailService<R: TemplateRenderer, T: MailTransport> {
    renderer: Arc<R>,
    transport: Arc<T>,
    server_base_url: String,
}

impl<R: TemplateRenderer, T: MailTransport> EmailService<R, T> {
    pub fn new(renderer: Arc<R>, transport: Arc<T>, server_base_url: impl Into<String>) -> Self {
        let mut server_base_url = server_base_url.into();
        if !server_base_url.ends_with('/') {
            server_base_url.push('/');
        }
        Self {
            renderer,
            transport,
            server_base_url,
        }
    }

    pub fn is_valid_email(&self, address: &str) -> bool {
        is_valid_email_address(address)
    }

    /// Checks kind and recipient. Nothing downstream runs if this fails.
    fn prepare(&self, kind: &str, fields: &TemplateFields) -> Result<NotificationRequest, NotificationError> {
        let kind: NotificationKind = kind
            .parse()
            .map_err(|e: UnknownNotificationKind| NotificationError::InvalidInput(e.to_string()))?;
        let recipient = fields
            .get("email")
            .ok_or_else(|| NotificationError::InvalidInput("missing recipient address".into()))?;
        if !self.is_valid_email(recipient) {
            return Err(NotificationError::InvalidInput(format!(
                "invalid recipient address: {}",
                mask_email(recipient)
            )));
        }
        Ok(NotificationRequest {
            recipient: recipient.clone(),
            kind,
            variables: fields.clone(),
        })
    }

    /// Renders `kind` with `fields` and delivers it to `fields["email"]`.
    pub async fn send(&self, kind: &str, fields: &TemplateFields) -> Result<(), NotificationError> {
        let request = self.prepare(kind, fields)?;
        let masked = mask_email(&request.recipient);

        let html = self
            .renderer
            .render(request.kind, &request.variables)
            .map_err(|e| {
                error!("Rendering {} for {} failed: {}", request.kind.as_str(), masked, e);
                NotificationError::Content(e)
            })?;

        match self
            .transport
            .send(request.kind.subject(), &html, &request.recipient)
            .await
        {
            Ok(()) => {
                info!("Sent {} notification to {}", request.kind.as_str(), masked);
                Ok(())
            }
            Err(TransportError::Other(source)) => Err(NotificationError::Unexpected(source)),
            Err(e) => {
                error!("Delivering {} to {} failed: {}", request.kind.as_str(), masked, e);
                Err(NotificationError::Transport(e.to_string()))
            }
        }
    }

    /// `{server_base_url}verify-email/{id}/{token}`
    pub fn verification_url(&self, user: &User) -> Option<String> {
        user.verification_token
            .as_ref()
            .map(|token| format!("{}verify-email/{}/{}", self.server_base_url, user.id, token))
    }

    pub async fn send_verification(&self, user: &User) -> Result<(), NotificationError> {
        let url = self.verification_url(user).ok_or_else(|| {
            NotificationError::InvalidInput("user has no pending verification".into())
        })?;
        let mut fields = base_fields(user);
        fields.insert("verification_url".into(), url);
        self.send(NotificationKind::Verification.as_str(), &fields).await
    }
}

/// Variables every template can rely on.
pub(crate) fn base_fields(user: &User) -> TemplateFields {
    let mut fields = TemplateFields::new();
    fields.insert("email".into(), user.email.clone());
    fields.insert("name".into(), user.greeting_name());
    fields.insert("nickname".into(), user.nickname.clone());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewUser, UserRole};
    use crate::notifications::ports::{MockMailTransport, MockTemplateRenderer};
    use mockall::predicate::eq;

    fn fields(email: &str) -> TemplateFields {
        let mut fields = TemplateFields::new();
        fields.insert("email".into(), email.into());
        fields.insert("name".into(), "John".into());
        fields
    }

    fn service(
        renderer: MockTemplateRenderer,
        transport: MockMailTransport,
    ) -> EmailService<MockTemplateRenderer, MockMailTransport> {
        EmailService::new(Arc::new(renderer), Arc::new(transport), "http://localhost:8000")
    }

    fn pending_user() -> User {
        User::new(
            NewUser::new("john.doe@example.com", "unused"),
            "johndoe".into(),
            "hash".into(),
            UserRole::Authenticated,
            Some("abc123".into()),
        )
    }

    #[test]
    fn test_validate_address() {
        let svc = service(MockTemplateRenderer::new(), MockMailTransport::new());
        assert!(svc.is_valid_email("john.doe@example.com"));
        assert!(svc.is_valid_email("a+b@mail.example.org"));
        assert!(!svc.is_valid_email("john doe@example.com"));
        assert!(!svc.is_valid_email("john@localhost"));
        assert!(!svc.is_valid_email(""));
    }

    #[tokio::test]
    async fn test_unknown_kind_rejected_before_render() {
        let mut renderer = MockTemplateRenderer::new();
        renderer.expect_render().times(0);
        let mut transport = MockMailTransport::new();
        transport.expect_send().times(0);

        let result = service(renderer, transport)
            .send("unknown_kind", &TemplateFields::new())
            .await;
        assert!(matches!(result, Err(NotificationError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_serialized_kind_is_accepted() {
        let mut renderer = MockTemplateRenderer::new();
        renderer
            .expect_render()
            .withf(|kind, _| *kind == NotificationKind::Verification)
            .times(1)
            .returning(|_, _| Ok("<p>verify</p>".into()));
        let mut transport = MockMailTransport::new();
        transport
            .expect_send()
            .with(
                eq("Verify Your Account"),
                eq("<p>verify</p>"),
                eq("john.doe@example.com"),
            )
            .times(1)
            .returning(|_, _, _| Ok(()));

        let wire: String =
            serde_json::from_value(serde_json::to_value(NotificationKind::Verification).unwrap())
                .unwrap();
        service(renderer, transport)
            .send(&wire, &fields("john.doe@example.com"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_address_rejected_before_render() {
        let mut renderer = MockTemplateRenderer::new();
        renderer.expect_render().times(0);
        let mut transport = MockMailTransport::new();
        transport.expect_send().times(0);

        let result = service(renderer, transport)
            .send("password_reset", &fields("not-an-address"))
            .await;
        assert!(matches!(result, Err(NotificationError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_render_failure_skips_delivery() {
        let mut renderer = MockTemplateRenderer::new();
        renderer
            .expect_render()
            .times(1)
            .returning(|_, _| Err(TemplateError::MissingVariable("name".into())));
        let mut transport = MockMailTransport::new();
        transport.expect_send().times(0);

        let result = service(renderer, transport)
            .send("account_locked", &fields("john.doe@example.com"))
            .await;
        assert!(matches!(result, Err(NotificationError::Content(_))));
    }

    #[tokio::test]
    async fn test_delivers_with_mapped_subject() {
        let mut renderer = MockTemplateRenderer::new();
        renderer
            .expect_render()
            .withf(|kind, _| *kind == NotificationKind::PasswordReset)
            .times(1)
            .returning(|_, _| Ok("<p>hi</p>".into()));
        let mut transport = MockMailTransport::new();
        transport
            .expect_send()
            .with(
                eq("Password Reset Instructions"),
                eq("<p>hi</p>"),
                eq("john.doe@example.com"),
            )
            .times(1)
            .returning(|_, _, _| Ok(()));

        service(renderer, transport)
            .send("password_reset", &fields("john.doe@example.com"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_transport_failures_classified() {
        let mut renderer = MockTemplateRenderer::new();
        renderer.expect_render().returning(|_, _| Ok("<p>hi</p>".into()));
        let mut transport = MockMailTransport::new();
        let mut calls = 0;
        transport.expect_send().times(2).returning(move |_, _, _| {
            calls += 1;
            if calls == 1 {
                Err(TransportError::Connection("connection refused".into()))
            } else {
                Err(TransportError::Other("boom".into()))
            }
        });

        let svc = service(renderer, transport);
        let first = svc.send("account_locked", &fields("john.doe@example.com")).await;
        assert!(matches!(first, Err(NotificationError::Transport(_))));
        let second = svc.send("account_locked", &fields("john.doe@example.com")).await;
        match second {
            Err(NotificationError::Unexpected(source)) => assert_eq!(source.to_string(), "boom"),
            other => panic!("expected unexpected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_verification_builds_link() {
        let user = pending_user();
        let expected = format!("http://localhost:8000/verify-email/{}/abc123", user.id);

        let mut renderer = MockTemplateRenderer::new();
        let link = expected.clone();
        renderer
            .expect_render()
            .withf(move |kind, fields| {
                *kind == NotificationKind::Verification
                    && fields.get("verification_url") == Some(&link)
                    && fields.get("name").map(String::as_str) == Some("johndoe")
            })
            .times(1)
            .returning(|_, _| Ok("<p>verify</p>".into()));
        let mut transport = MockMailTransport::new();
        transport
            .expect_send()
            .with(eq("Verify Your Account"), eq("<p>verify</p>"), eq("john.doe@example.com"))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let svc = service(renderer, transport);
        assert_eq!(svc.verification_url(&user), Some(expected));
        svc.send_verification(&user).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_verification_requires_token() {
        let mut user = pending_user();
        user.mark_verified();
        let mut renderer = MockTemplateRenderer::new();
        renderer.expect_render().times(0);

        let result = service(renderer, MockMailTransport::new())
            .send_verification(&user)
            .await;
        assert!(matches!(result, Err(NotificationError::InvalidInput(_))));
    }
}

//! Notification value objects. Never persisted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Named template variables. The recipient travels under `email`.
pub type TemplateFields = BTreeMap<String, String>;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown notification kind: {0}")]
pub struct UnknownNotificationKind(pub String);

/// Serialized form matches [`NotificationKind::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[serde(rename = "email_verification")]
    Verification,
    PasswordReset,
    AccountLocked,
}

impl NotificationKind {
    /// Wire name, also the template file stem.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Verification => "email_verification",
            NotificationKind::PasswordReset => "password_reset",
            NotificationKind::AccountLocked => "account_locked",
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            NotificationKind::Verification => "Verify Your Account",
            NotificationKind::PasswordReset => "Password Reset Instructions",
            NotificationKind::AccountLocked => "Account Locked Notification",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = UnknownNotificationKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email_verification" => Ok(NotificationKind::Verification),
            "password_reset" => Ok(NotificationKind::PasswordReset),
            "account_locked" => Ok(NotificationKind::AccountLocked),
            _ => Err(UnknownNotificationKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub recipient: String,
    pub kind: NotificationKind,
    pub variables: TemplateFields,
}

//! User domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use account_shared::new_id;

use super::role::UserRole;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub nickname: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub profile_picture_url: Option<String>,
    pub linkedin_profile_url: Option<String>,
    pub github_profile_url: Option<String>,

    pub role: UserRole,
    pub email_verified: bool,
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,

    pub failed_login_attempts: i32,
    pub is_locked: bool,
    pub last_login_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration input. Validated by [`crate::validation::validate_new_user`]
/// before a [`User`] is ever built from it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub nickname: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub profile_picture_url: Option<String>,
    pub linkedin_profile_url: Option<String>,
    pub github_profile_url: Option<String>,
}

impl NewUser {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }
}

/// Partial update. Only `Some` fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub profile_picture_url: Option<String>,
    pub linkedin_profile_url: Option<String>,
    pub github_profile_url: Option<String>,
    pub role: Option<UserRole>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.nickname.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.bio.is_none()
            && self.profile_picture_url.is_none()
            && self.linkedin_profile_url.is_none()
            && self.github_profile_url.is_none()
            && self.role.is_none()
    }
}

impl User {
    /// Builds a fresh record. A pre-verified user carries no verification token.
    pub fn new(
        input: NewUser,
        nickname: String,
        password_hash: String,
        role: UserRole,
        verification_token: Option<String>,
    ) -> Self {
        let now = Utc::now();
        let email_verified = verification_token.is_none();
        Self {
            id: new_id(),
            nickname,
            email: input.email,
            password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
            bio: input.bio,
            profile_picture_url: input.profile_picture_url,
            linkedin_profile_url: input.linkedin_profile_url,
            github_profile_url: input.github_profile_url,
            role,
            email_verified,
            verification_token,
            failed_login_attempts: 0,
            is_locked: false,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(f), Some(l)) => format!("{} {}", f, l),
            (Some(f), None) => f.clone(),
            (None, Some(l)) => l.clone(),
            _ => self.nickname.clone(),
        }
    }

    /// Name used to greet the user in notifications.
    pub fn greeting_name(&self) -> String {
        self.first_name.clone().unwrap_or_else(|| self.nickname.clone())
    }

    pub fn can_login(&self) -> bool {
        !self.is_locked
    }

    pub fn record_login(&mut self, at: DateTime<Utc>) {
        self.failed_login_attempts = 0;
        self.last_login_at = Some(at);
        self.updated_at = at;
    }

    /// Counts one failed attempt. Returns `true` only for the attempt that
    /// moves the account into the locked state.
    pub fn record_failed_login(&mut self, max_attempts: i32) -> bool {
        self.failed_login_attempts = self.failed_login_attempts.saturating_add(1);
        self.updated_at = Utc::now();
        if !self.is_locked && self.failed_login_attempts >= max_attempts {
            self.is_locked = true;
            return true;
        }
        false
    }

    pub fn unlock(&mut self) {
        self.is_locked = false;
        self.failed_login_attempts = 0;
        self.updated_at = Utc::now();
    }

    pub fn mark_verified(&mut self) {
        self.email_verified = true;
        self.verification_token = None;
        if self.role == UserRole::Anonymous {
            self.role = UserRole::Authenticated;
        }
        self.updated_at = Utc::now();
    }

    pub fn set_password_hash(&mut self, password_hash: String) {
        self.password_hash = password_hash;
        self.updated_at = Utc::now();
    }

    /// Applies an already validated update.
    pub fn apply(&mut self, changes: UserUpdate) {
        let UserUpdate {
            email,
            nickname,
            first_name,
            last_name,
            bio,
            profile_picture_url,
            linkedin_profile_url,
            github_profile_url,
            role,
        } = changes;

        if let Some(email) = email {
            self.email = email;
        }
        if let Some(nickname) = nickname {
            self.nickname = nickname;
        }
        if first_name.is_some() {
            self.first_name = first_name;
        }
        if last_name.is_some() {
            self.last_name = last_name;
        }
        if bio.is_some() {
            self.bio = bio;
        }
        if profile_picture_url.is_some() {
            self.profile_picture_url = profile_picture_url;
        }
        if linkedin_profile_url.is_some() {
            self.linkedin_profile_url = linkedin_profile_url;
        }
        if github_profile_url.is_some() {
            self.github_profile_url = github_profile_url;
        }
        if let Some(role) = role {
            self.role = role;
        }
        self.updated_at = Utc::now();
    }
}

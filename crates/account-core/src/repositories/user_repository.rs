//! User repository trait (port)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use account_shared::PageRequest;

use crate::domain::User;
use crate::error::DomainError;

/// Row state after a failed login was counted.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedLogin {
    pub user: User,
    /// `true` only for the attempt that moved the account from unlocked to
    /// locked.
    pub locked_now: bool,
}

/// Storage contract for user records.
///
/// Implementations must enforce email and nickname uniqueness themselves
/// (returning [`DomainError::EmailAlreadyExists`] /
/// [`DomainError::NicknameAlreadyExists`]). The lockout columns
/// (`failed_login_attempts`, `is_locked`, `last_login_at`) are only ever
/// changed by the dedicated single-step methods, never by [`UserRepository::update`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, DomainError>;
    async fn count(&self) -> Result<u64, DomainError>;
    async fn create(&self, user: &User) -> Result<User, DomainError>;
    /// Overwrites identity, profile, role, verification and password
    /// columns. Lockout columns keep their stored values. `UserNotFound` if
    /// the row is gone.
    async fn update(&self, user: &User) -> Result<User, DomainError>;
    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError>;
    /// Creation order.
    async fn list(&self, page: PageRequest) -> Result<Vec<User>, DomainError>;
    /// Increments the failed-login counter and sets the locked flag once the
    /// counter reaches `max_attempts`, as one atomic step. `None` if the row
    /// no longer exists.
    async fn record_failed_login(
        &self,
        id: &Uuid,
        max_attempts: i32,
    ) -> Result<Option<FailedLogin>, DomainError>;
    /// Resets the counter and stamps `at`, but only while the account is
    /// unlocked. `None` if the row is gone or locked.
    async fn record_successful_login(
        &self,
        id: &Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<User>, DomainError>;
    /// Clears the lock and the counter in one step. `None` if the row is gone.
    async fn unlock(&self, id: &Uuid) -> Result<Option<User>, DomainError>;
}

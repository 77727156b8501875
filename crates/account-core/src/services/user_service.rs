// ============================================================================
// Account Core - User Service
// File: crates/account-core/src/services/user_service.rs
// ============================================================================
//! Account state manager: registration, lookup, update, login with lockout,
//! unlock, password reset and email verification.
//!
//! Expected failures (invalid input, duplicates, unknown ids, bad
//! credentials) are reported as `Ok(None)` / `Ok(false)`. An `Err` always
//! means the store or the hasher failed.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use account_security::token::{generate_verification_token, tokens_match};
use account_security::{PasswordPolicy, PasswordService};
use account_shared::utils::mask_email;
use account_shared::{AccountSettings, Page, PageRequest};

use crate::domain::{NewUser, User, UserRole, UserUpdate};
use crate::error::DomainError;
use crate::nickname::generate_nickname;
use crate::notifications::AccountNotifier;
use crate::repositories::UserRepository;
use crate::validation::{validate_new_user, validate_update};

const MAX_NICKNAME_ATTEMPTS: usize = 10;

pub struct UserService<R: UserRepository> {
    user_repo: Arc<R>,
    settings: AccountSettings,
    policy: PasswordPolicy,
    notifier: Option<Arc<dyn AccountNotifier>>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(user_repo: Arc<R>, settings: AccountSettings) -> Self {
        let policy = PasswordPolicy::default().with_min_strength(settings.min_password_strength);
        Self {
            user_repo,
            settings,
            policy,
            notifier: None,
        }
    }

    /// Attaches the notifier used for lock and password-reset notices.
    pub fn with_notifier(mut self, notifier: Arc<dyn AccountNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    fn max_attempts(&self) -> i32 {
        i32::try_from(self.settings.max_login_attempts)
            .unwrap_or(i32::MAX)
            .max(1)
    }

    /// Writes `user` back. A row that vanished or now collides reads as `None`.
    async fn persist(&self, user: &User) -> Result<Option<User>, DomainError> {
        match self.user_repo.update(user).await {
            Ok(saved) => Ok(Some(saved)),
            Err(DomainError::UserNotFound) => Ok(None),
            Err(e) if e.is_conflict() => {
                warn!("Update of user {} rejected by store: {}", user.id, e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn unique_nickname(&self, requested: Option<&str>) -> Result<Option<String>, DomainError> {
        if let Some(nickname) = requested {
            if self.user_repo.find_by_nickname(nickname).await?.is_some() {
                warn!("Registration rejected: nickname {} taken", nickname);
                return Ok(None);
            }
            return Ok(Some(nickname.to_string()));
        }

        for _ in 0..MAX_NICKNAME_ATTEMPTS {
            let candidate = generate_nickname();
            if self.user_repo.find_by_nickname(&candidate).await?.is_none() {
                return Ok(Some(candidate));
            }
            debug!("Generated nickname {} already taken, retrying", candidate);
        }
        Err(DomainError::UnableToGenerateUniqueName)
    }

    /// Registers a user and, unless the record is pre-verified, asks
    /// `notifier` to send the verification message.
    ///
    /// The very first user becomes `ADMIN` and starts verified. A failed
    /// notification is logged; the committed record is still returned.
    pub async fn create<N: AccountNotifier + ?Sized>(
        &self,
        input: NewUser,
        notifier: &N,
    ) -> Result<Option<User>, DomainError> {
        let masked = mask_email(&input.email);

        if let Err(errors) = validate_new_user(&input, &self.policy) {
            warn!("Registration rejected for {}: {}", masked, errors);
            return Ok(None);
        }

        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            warn!("Registration rejected: {} already registered", masked);
            return Ok(None);
        }

        let nickname = match self.unique_nickname(input.nickname.as_deref()).await? {
            Some(nickname) => nickname,
            None => return Ok(None),
        };

        let password_hash = PasswordService::hash(&input.password)
            .map_err(|e| DomainError::PasswordHashError(e.to_string()))?;

        let first_user = self.user_repo.count().await? == 0;
        let (role, token) = if first_user {
            (UserRole::Admin, None)
        } else {
            (UserRole::Authenticated, Some(generate_verification_token()))
        };

        let user = User::new(input, nickname, password_hash, role, token);
        let created = match self.user_repo.create(&user).await {
            Ok(created) => created,
            Err(e) if e.is_conflict() => {
                warn!("Registration for {} lost a uniqueness race: {}", masked, e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        info!(
            "Registered user {} ({}) as {}",
            created.id, masked, created.role
        );

        if !created.email_verified {
            if let Err(e) = notifier.send_verification(&created).await {
                error!(
                    "User {} created but verification notice failed: {}",
                    created.id, e
                );
            }
        }

        Ok(Some(created))
    }

    /// Self-registration entry point; same contract as [`Self::create`].
    pub async fn register_user<N: AccountNotifier + ?Sized>(
        &self,
        input: NewUser,
        notifier: &N,
    ) -> Result<Option<User>, DomainError> {
        self.create(input, notifier).await
    }

    pub async fn get_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError> {
        self.user_repo.find_by_id(id).await
    }

    pub async fn get_by_nickname(&self, nickname: &str) -> Result<Option<User>, DomainError> {
        self.user_repo.find_by_nickname(nickname).await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        self.user_repo.find_by_email(email).await
    }

    /// Applies only the supplied fields. Any invalid or colliding field
    /// leaves the record untouched and yields `None`, as does an unknown id.
    pub async fn update(&self, id: &Uuid, changes: UserUpdate) -> Result<Option<User>, DomainError> {
        if let Err(errors) = validate_update(&changes) {
            warn!("Update of user {} rejected: {}", id, errors);
            return Ok(None);
        }

        let Some(mut user) = self.user_repo.find_by_id(id).await? else {
            return Ok(None);
        };

        if let Some(email) = changes.email.as_deref() {
            if let Some(owner) = self.user_repo.find_by_email(email).await? {
                if owner.id != user.id {
                    warn!("Update of user {} rejected: email {} taken", id, mask_email(email));
                    return Ok(None);
                }
            }
        }
        if let Some(nickname) = changes.nickname.as_deref() {
            if let Some(owner) = self.user_repo.find_by_nickname(nickname).await? {
                if owner.id != user.id {
                    warn!("Update of user {} rejected: nickname {} taken", id, nickname);
                    return Ok(None);
                }
            }
        }

        user.apply(changes);
        let saved = self.persist(&user).await?;
        if saved.is_some() {
            info!("Updated user {}", id);
        }
        Ok(saved)
    }

    /// Hard delete. `false` when nothing was removed.
    pub async fn delete(&self, id: &Uuid) -> Result<bool, DomainError> {
        let removed = self.user_repo.delete(id).await?;
        if removed {
            info!("Deleted user {}", id);
        }
        Ok(removed)
    }

    /// Creation-ordered slice; `limit` is taken as given.
    pub async fn list_users(&self, skip: u32, limit: u32) -> Result<Vec<User>, DomainError> {
        self.user_repo.list(PageRequest::new(skip, limit)).await
    }

    /// Bounded page with the overall user count.
    pub async fn list_users_page(&self, request: PageRequest) -> Result<Page<User>, DomainError> {
        let request = request.clamped();
        let items = self.user_repo.list(request).await?;
        let total = self.user_repo.count().await?;
        Ok(Page::new(items, total, request))
    }

    pub async fn count(&self) -> Result<u64, DomainError> {
        self.user_repo.count().await
    }

    /// Returns the user on success. Unknown email, wrong password and a
    /// locked account are indistinguishable to the caller.
    ///
    /// A wrong password counts against the account; the attempt that reaches
    /// the configured maximum locks it within this call.
    pub async fn login_user(&self, email: &str, password: &str) -> Result<Option<User>, DomainError> {
        let masked = mask_email(email);

        let Some(user) = self.user_repo.find_by_email(email).await? else {
            warn!("Login failed: unknown email {}", masked);
            return Ok(None);
        };

        if !user.can_login() {
            warn!("Login refused: account {} is locked", user.id);
            return Ok(None);
        }

        let password_valid = PasswordService::verify(password, &user.password_hash)
            .map_err(|e| DomainError::PasswordHashError(e.to_string()))?;

        if !password_valid {
            let max = self.max_attempts();
            let Some(outcome) = self.user_repo.record_failed_login(&user.id, max).await? else {
                return Ok(None);
            };
            warn!(
                "Login failed for user {} ({}/{} attempts)",
                outcome.user.id, outcome.user.failed_login_attempts, max
            );
            if outcome.locked_now {
                warn!(
                    "Account {} locked after {} failed logins",
                    outcome.user.id, outcome.user.failed_login_attempts
                );
                self.notify_locked(&outcome.user).await;
            }
            return Ok(None);
        }

        // The store refuses the write if a concurrent failure locked the row
        // after it was read above.
        let Some(saved) = self
            .user_repo
            .record_successful_login(&user.id, Utc::now())
            .await?
        else {
            warn!("Login refused: account {} was locked or removed mid-login", user.id);
            return Ok(None);
        };
        info!("User {} logged in", saved.id);
        Ok(Some(saved))
    }

    /// `false` for unknown emails.
    pub async fn is_account_locked(&self, email: &str) -> Result<bool, DomainError> {
        Ok(self
            .user_repo
            .find_by_email(email)
            .await?
            .map(|u| u.is_locked)
            .unwrap_or(false))
    }

    pub async fn unlock_user_account(&self, id: &Uuid) -> Result<bool, DomainError> {
        let unlocked = self.user_repo.unlock(id).await?.is_some();
        if unlocked {
            info!("Unlocked user {}", id);
        }
        Ok(unlocked)
    }

    /// Replaces the password after checking it against the creation policy.
    pub async fn reset_password(&self, id: &Uuid, new_password: &str) -> Result<bool, DomainError> {
        if let Err(e) = self.policy.validate(new_password) {
            warn!("Password reset for user {} rejected: {}", id, e);
            return Ok(false);
        }

        let Some(mut user) = self.user_repo.find_by_id(id).await? else {
            return Ok(false);
        };

        let password_hash = PasswordService::hash(new_password)
            .map_err(|e| DomainError::PasswordHashError(e.to_string()))?;
        user.set_password_hash(password_hash);

        let Some(saved) = self.persist(&user).await? else {
            return Ok(false);
        };
        info!("Password reset for user {}", id);

        match &self.notifier {
            Some(notifier) => {
                if let Err(e) = notifier.send_password_reset(&saved).await {
                    error!("Password reset notice for user {} failed: {}", id, e);
                }
            }
            None => warn!("No notifier attached; password reset notice for user {} not sent", id),
        }
        Ok(true)
    }

    /// Succeeds only when `token` equals the pending token exactly. Any
    /// mismatch, including an already verified account, changes nothing.
    pub async fn verify_email_with_token(&self, email: &str, token: &str) -> Result<bool, DomainError> {
        let Some(mut user) = self.user_repo.find_by_email(email).await? else {
            return Ok(false);
        };

        let matches = user
            .verification_token
            .as_deref()
            .is_some_and(|expected| tokens_match(token, expected));
        if !matches {
            warn!("Verification token mismatch for {}", mask_email(email));
            return Ok(false);
        }

        user.mark_verified();
        let verified = self.persist(&user).await?.is_some();
        if verified {
            info!("Email verified for user {}", user.id);
        }
        Ok(verified)
    }

    async fn notify_locked(&self, user: &User) {
        let Some(notifier) = &self.notifier else {
            warn!("No notifier attached; lock notice for user {} not sent", user.id);
            return;
        };
        if let Err(e) = notifier.send_account_locked(user).await {
            error!("Lock notice for user {} failed: {}", user.id, e);
        }
    }
}

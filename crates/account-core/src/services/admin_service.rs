// ============================================================================
// Account Core - Admin User Service
// File: crates/account-core/src/services/admin_service.rs
// ============================================================================
//! Role-gated front for administrative account operations.
//!
//! Permission failures are `Err(DomainError::Forbidden)`; once a call is
//! allowed, results follow the state manager's soft-fail contract.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use account_shared::{Page, PageRequest};

use crate::access::{require, Actor};
use crate::domain::{NewUser, Permission, User, UserUpdate};
use crate::error::DomainError;
use crate::notifications::AccountNotifier;
use crate::repositories::UserRepository;
use crate::services::UserService;

pub struct AdminUserService<R: UserRepository> {
    users: Arc<UserService<R>>,
}

impl<R: UserRepository> AdminUserService<R> {
    pub fn new(users: Arc<UserService<R>>) -> Self {
        Self { users }
    }

    fn guard(&self, actor: &Actor, permission: Permission) -> Result<(), DomainError> {
        require(actor, permission).inspect_err(|_| {
            warn!("User {} ({}) denied {:?}", actor.id, actor.role, permission);
        })
    }

    /// Loads the target of a mutating call. Actors may only act on accounts
    /// whose role does not outrank their own. `None` for unknown ids.
    async fn target(&self, actor: &Actor, id: &Uuid) -> Result<Option<User>, DomainError> {
        let Some(target) = self.users.get_by_id(id).await? else {
            return Ok(None);
        };
        if !actor.role.has_at_least(target.role) {
            warn!(
                "User {} ({}) denied action on {} ({})",
                actor.id, actor.role, target.id, target.role
            );
            return Err(DomainError::Forbidden(format!(
                "{} cannot manage a {} account",
                actor.role, target.role
            )));
        }
        Ok(Some(target))
    }

    pub async fn create_user<N: AccountNotifier + ?Sized>(
        &self,
        actor: &Actor,
        input: NewUser,
        notifier: &N,
    ) -> Result<Option<User>, DomainError> {
        self.guard(actor, Permission::CreateUsers)?;
        self.users.create(input, notifier).await
    }

    /// Anyone may read their own record.
    pub async fn get_user(&self, actor: &Actor, id: &Uuid) -> Result<Option<User>, DomainError> {
        if actor.id != *id {
            self.guard(actor, Permission::ReadUsers)?;
        }
        self.users.get_by_id(id).await
    }

    pub async fn list_users(&self, actor: &Actor, request: PageRequest) -> Result<Page<User>, DomainError> {
        self.guard(actor, Permission::ReadUsers)?;
        self.users.list_users_page(request).await
    }

    /// Changing a role additionally needs [`Permission::ManageRoles`].
    pub async fn update_user(
        &self,
        actor: &Actor,
        id: &Uuid,
        changes: UserUpdate,
    ) -> Result<Option<User>, DomainError> {
        self.guard(actor, Permission::UpdateUsers)?;
        if changes.role.is_some() {
            self.guard(actor, Permission::ManageRoles)?;
        }
        if self.target(actor, id).await?.is_none() {
            return Ok(None);
        }
        self.users.update(id, changes).await
    }

    pub async fn delete_user(&self, actor: &Actor, id: &Uuid) -> Result<bool, DomainError> {
        self.guard(actor, Permission::DeleteUsers)?;
        let removed = self.users.delete(id).await?;
        if removed {
            info!("User {} deleted by {}", id, actor.id);
        }
        Ok(removed)
    }

    pub async fn unlock_user(&self, actor: &Actor, id: &Uuid) -> Result<bool, DomainError> {
        self.guard(actor, Permission::UnlockUsers)?;
        if self.target(actor, id).await?.is_none() {
            return Ok(false);
        }
        self.users.unlock_user_account(id).await
    }

    pub async fn reset_password(
        &self,
        actor: &Actor,
        id: &Uuid,
        new_password: &str,
    ) -> Result<bool, DomainError> {
        self.guard(actor, Permission::ResetPasswords)?;
        if self.target(actor, id).await?.is_none() {
            return Ok(false);
        }
        self.users.reset_password(id, new_password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;
    use crate::notifications::MockAccountNotifier;
    use crate::repositories::InMemoryUserRepository;
    use account_shared::AccountSettings;

    const PASSWORD: &str = "Str0ng!Pass";

    async fn setup() -> (AdminUserService<InMemoryUserRepository>, User, User) {
        let users = Arc::new(UserService::new(
            Arc::new(InMemoryUserRepository::new()),
            AccountSettings::default(),
        ));
        let mut notifier = MockAccountNotifier::new();
        notifier.expect_send_verification().returning(|_| Ok(()));

        let admin = users
            .create(NewUser::new("admin@example.com", PASSWORD), &notifier)
            .await
            .unwrap()
            .unwrap();
        let member = users
            .create(NewUser::new("member@example.com", PASSWORD), &notifier)
            .await
            .unwrap()
            .unwrap();
        (AdminUserService::new(users), admin, member)
    }

    #[tokio::test]
    async fn test_self_read_allowed() {
        let (svc, _, member) = setup().await;
        let actor = Actor::new(member.id, member.role);
        assert!(svc.get_user(&actor, &member.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_member_cannot_administer() {
        let (svc, admin, member) = setup().await;
        let actor = Actor::new(member.id, member.role);

        assert!(matches!(
            svc.get_user(&actor, &admin.id).await,
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            svc.delete_user(&actor, &admin.id).await,
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            svc.list_users(&actor, PageRequest::default()).await,
            Err(DomainError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_manager_limits() {
        let (svc, _, member) = setup().await;
        let manager = Actor::new(uuid::Uuid::new_v4(), UserRole::Manager);

        assert!(svc.unlock_user(&manager, &member.id).await.unwrap());

        let bio = UserUpdate {
            bio: Some("updated by manager".into()),
            ..UserUpdate::default()
        };
        assert!(svc.update_user(&manager, &member.id, bio).await.unwrap().is_some());

        let promote = UserUpdate {
            role: Some(UserRole::Admin),
            ..UserUpdate::default()
        };
        assert!(matches!(
            svc.update_user(&manager, &member.id, promote).await,
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            svc.delete_user(&manager, &member.id).await,
            Err(DomainError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_admin_full_access() {
        let (svc, admin, member) = setup().await;
        let actor = Actor::new(admin.id, admin.role);

        let promote = UserUpdate {
            role: Some(UserRole::Manager),
            ..UserUpdate::default()
        };
        let promoted = svc.update_user(&actor, &member.id, promote).await.unwrap().unwrap();
        assert_eq!(promoted.role, UserRole::Manager);

        let page = svc.list_users(&actor, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 2);

        assert!(svc.reset_password(&actor, &member.id, "N3w!Password").await.unwrap());
        assert!(svc.delete_user(&actor, &member.id).await.unwrap());
        assert!(!svc.delete_user(&actor, &member.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_manager_cannot_touch_admin_account() {
        let (svc, admin, _) = setup().await;
        let manager = Actor::new(uuid::Uuid::new_v4(), UserRole::Manager);

        assert!(matches!(
            svc.reset_password(&manager, &admin.id, "Att4cker!Pass").await,
            Err(DomainError::Forbidden(_))
        ));
        let hijack = UserUpdate {
            email: Some("manager@evil.test".into()),
            ..UserUpdate::default()
        };
        assert!(matches!(
            svc.update_user(&manager, &admin.id, hijack).await,
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            svc.unlock_user(&manager, &admin.id).await,
            Err(DomainError::Forbidden(_))
        ));

        // Admin record is untouched.
        assert!(svc
            .users
            .login_user("admin@example.com", PASSWORD)
            .await
            .unwrap()
            .is_some());
        assert!(svc.users.login_user("admin@example.com", "Att4cker!Pass").await.unwrap().is_none());
        let stored = svc.users.get_by_id(&admin.id).await.unwrap().unwrap();
        assert_eq!(stored.email, "admin@example.com");
    }

    #[tokio::test]
    async fn test_manager_on_missing_or_peer_account() {
        let (svc, _, member) = setup().await;
        let manager = Actor::new(uuid::Uuid::new_v4(), UserRole::Manager);
        let ghost = uuid::Uuid::new_v4();

        assert!(!svc.unlock_user(&manager, &ghost).await.unwrap());
        assert!(!svc.reset_password(&manager, &ghost, "N3w!Password").await.unwrap());
        assert!(svc
            .update_user(&manager, &ghost, UserUpdate { bio: Some("x".into()), ..UserUpdate::default() })
            .await
            .unwrap()
            .is_none());

        assert!(svc.reset_password(&manager, &member.id, "N3w!Password").await.unwrap());
    }
}

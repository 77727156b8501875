//! In-memory user repository for development and testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use account_shared::PageRequest;

use super::{FailedLogin, UserRepository};
use crate::domain::User;
use crate::error::DomainError;

/// Records live in a `Vec` so insertion order doubles as creation order.
/// Every mutation runs under one write lock, which gives the uniqueness
/// checks and the failed-login increment the atomicity the port requires.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn conflict(users: &[User], candidate: &User) -> Option<DomainError> {
    users.iter().filter(|u| u.id != candidate.id).find_map(|u| {
        if u.email == candidate.email {
            Some(DomainError::EmailAlreadyExists(candidate.email.clone()))
        } else if u.nickname == candidate.nickname {
            Some(DomainError::NicknameAlreadyExists(candidate.nickname.clone()))
        } else {
            None
        }
    })
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.users.read().iter().find(|u| u.id == *id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        Ok(self.users.read().iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, DomainError> {
        Ok(self.users.read().iter().find(|u| u.nickname == nickname).cloned())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(self.users.read().len() as u64)
    }

    async fn create(&self, user: &User) -> Result<User, DomainError> {
        let mut users = self.users.write();
        if let Some(err) = conflict(&users, user) {
            return Err(err);
        }
        users.push(user.clone());
        Ok(user.clone())
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let mut users = self.users.write();
        if let Some(err) = conflict(&users, user) {
            return Err(err);
        }
        let slot = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(DomainError::UserNotFound)?;
        let mut next = user.clone();
        next.failed_login_attempts = slot.failed_login_attempts;
        next.is_locked = slot.is_locked;
        next.last_login_at = slot.last_login_at;
        next.created_at = slot.created_at;
        *slot = next.clone();
        Ok(next)
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError> {
        let mut users = self.users.write();
        let before = users.len();
        users.retain(|u| u.id != *id);
        Ok(users.len() != before)
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<User>, DomainError> {
        Ok(self
            .users
            .read()
            .iter()
            .skip(page.skip as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn record_failed_login(
        &self,
        id: &Uuid,
        max_attempts: i32,
    ) -> Result<Option<FailedLogin>, DomainError> {
        let mut users = self.users.write();
        Ok(users.iter_mut().find(|u| u.id == *id).map(|user| {
            let locked_now = user.record_failed_login(max_attempts);
            FailedLogin {
                user: user.clone(),
                locked_now,
            }
        }))
    }

    async fn record_successful_login(
        &self,
        id: &Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<User>, DomainError> {
        let mut users = self.users.write();
        Ok(users
            .iter_mut()
            .find(|u| u.id == *id && !u.is_locked)
            .map(|user| {
                user.record_login(at);
                user.clone()
            }))
    }

    async fn unlock(&self, id: &Uuid) -> Result<Option<User>, DomainError> {
        let mut users = self.users.write();
        Ok(users.iter_mut().find(|u| u.id == *id).map(|user| {
            user.unlock();
            user.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewUser, UserRole};
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;

    fn user(email: &str, nickname: &str) -> User {
        User::new(
            NewUser::new(email, "unused"),
            nickname.into(),
            "hash".into(),
            UserRole::Authenticated,
            Some("token".into()),
        )
    }

    #[tokio::test]
    async fn test_uniqueness_enforced() {
        let repo = InMemoryUserRepository::new();
        repo.create(&user("a@b.com", "alpha")).await.unwrap();

        let dup_email = repo.create(&user("a@b.com", "beta")).await;
        assert!(matches!(dup_email, Err(DomainError::EmailAlreadyExists(_))));

        let dup_nick = repo.create(&user("c@d.com", "alpha")).await;
        assert!(matches!(dup_nick, Err(DomainError::NicknameAlreadyExists(_))));

        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_conflict_leaves_row_untouched() {
        let repo = InMemoryUserRepository::new();
        let first = repo.create(&user("a@b.com", "alpha")).await.unwrap();
        let second = repo.create(&user("c@d.com", "gamma")).await.unwrap();

        let mut changed = second.clone();
        changed.email = first.email.clone();
        assert!(repo.update(&changed).await.unwrap_err().is_conflict());

        let stored = repo.find_by_id(&second.id).await.unwrap().unwrap();
        assert_eq!(stored.email, "c@d.com");
    }

    #[tokio::test]
    async fn test_update_missing_row() {
        let repo = InMemoryUserRepository::new();
        let ghost = user("ghost@b.com", "ghost");
        assert!(matches!(repo.update(&ghost).await, Err(DomainError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let repo = InMemoryUserRepository::new();
        let created = repo.create(&user("a@b.com", "alpha")).await.unwrap();
        assert!(repo.delete(&created.id).await.unwrap());
        assert!(!repo.delete(&created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_in_creation_order() {
        let repo = InMemoryUserRepository::new();
        let mut ids = Vec::new();
        for i in 0..50 {
            let email: String = SafeEmail().fake();
            let created = repo
                .create(&user(&format!("{}{}", i, email), &format!("user_{}", i)))
                .await
                .unwrap();
            ids.push(created.id);
        }

        let page_1 = repo.list(PageRequest::new(0, 10)).await.unwrap();
        let page_2 = repo.list(PageRequest::new(10, 10)).await.unwrap();
        assert_eq!(page_1.len(), 10);
        assert_eq!(page_2.len(), 10);
        assert_eq!(page_1[0].id, ids[0]);
        assert_eq!(page_2[0].id, ids[10]);

        let tail = repo.list(PageRequest::new(45, 10)).await.unwrap();
        assert_eq!(tail.len(), 5);
    }

    #[tokio::test]
    async fn test_concurrent_failed_logins_are_not_lost() {
        let repo = std::sync::Arc::new(InMemoryUserRepository::new());
        let created = repo.create(&user("a@b.com", "alpha")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let repo = repo.clone();
            let id = created.id;
            handles.push(tokio::spawn(async move {
                repo.record_failed_login(&id, 100).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stored = repo.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(stored.failed_login_attempts, 20);
        assert!(!stored.is_locked);
    }

    #[tokio::test]
    async fn test_update_keeps_lockout_columns() {
        let repo = InMemoryUserRepository::new();
        let created = repo.create(&user("a@b.com", "alpha")).await.unwrap();
        let stale = created.clone();

        for _ in 0..3 {
            repo.record_failed_login(&created.id, 3).await.unwrap();
        }

        let mut changed = stale;
        changed.bio = Some("hello".into());
        let saved = repo.update(&changed).await.unwrap();
        assert_eq!(saved.bio.as_deref(), Some("hello"));
        assert!(saved.is_locked);
        assert_eq!(saved.failed_login_attempts, 3);

        let stored = repo.find_by_id(&created.id).await.unwrap().unwrap();
        assert!(stored.is_locked);
    }

    #[tokio::test]
    async fn test_failed_login_reports_lock_transition_once() {
        let repo = InMemoryUserRepository::new();
        let created = repo.create(&user("a@b.com", "alpha")).await.unwrap();

        let first = repo.record_failed_login(&created.id, 2).await.unwrap().unwrap();
        assert!(!first.locked_now);
        let second = repo.record_failed_login(&created.id, 2).await.unwrap().unwrap();
        assert!(second.locked_now);
        let third = repo.record_failed_login(&created.id, 2).await.unwrap().unwrap();
        assert!(!third.locked_now);
        assert!(third.user.is_locked);
    }

    #[tokio::test]
    async fn test_successful_login_refused_while_locked() {
        let repo = InMemoryUserRepository::new();
        let created = repo.create(&user("a@b.com", "alpha")).await.unwrap();
        repo.record_failed_login(&created.id, 1).await.unwrap();

        assert!(repo
            .record_successful_login(&created.id, Utc::now())
            .await
            .unwrap()
            .is_none());

        let unlocked = repo.unlock(&created.id).await.unwrap().unwrap();
        assert!(!unlocked.is_locked);
        assert_eq!(unlocked.failed_login_attempts, 0);

        let logged_in = repo
            .record_successful_login(&created.id, Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert!(logged_in.last_login_at.is_some());
        assert!(repo.unlock(&Uuid::new_v4()).await.unwrap().is_none());
    }
}

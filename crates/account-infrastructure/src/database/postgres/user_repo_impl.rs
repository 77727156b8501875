// ============================================================================
// Account Infrastructure - PostgreSQL User Repository
// File: crates/account-infrastructure/src/database/postgres/user_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{error, info};
use uuid::Uuid;

use account_core::domain::User;
use account_core::error::DomainError;
use account_core::repositories::{FailedLogin, UserRepository};
use account_shared::PageRequest;

const USER_COLUMNS: &str = r#"
    id, nickname, email, password_hash,
    first_name, last_name, bio,
    profile_picture_url, linkedin_profile_url, github_profile_url,
    role, email_verified, verification_token,
    failed_login_attempts, is_locked, last_login_at,
    created_at, updated_at
"#;

/// `USER_COLUMNS` prefixed with `users.`, for statements that join another
/// relation exposing overlapping names.
fn qualified_columns() -> String {
    USER_COLUMNS
        .split(',')
        .map(|c| format!("users.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

const EMAIL_CONSTRAINT: &str = "users_email_key";
const NICKNAME_CONSTRAINT: &str = "users_nickname_key";

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
struct UserRow {
    pub id: Uuid,
    pub nickname: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub profile_picture_url: Option<String>,
    pub linkedin_profile_url: Option<String>,
    pub github_profile_url: Option<String>,
    pub role: String,
    pub email_verified: bool,
    pub verification_token: Option<String>,
    pub failed_login_attempts: i32,
    pub is_locked: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct FailedLoginRow {
    #[sqlx(flatten)]
    user: UserRow,
    was_locked: bool,
}

impl TryFrom<FailedLoginRow> for FailedLogin {
    type Error = DomainError;

    fn try_from(row: FailedLoginRow) -> Result<Self, Self::Error> {
        let user = User::try_from(row.user)?;
        let locked_now = user.is_locked && !row.was_locked;
        Ok(FailedLogin { user, locked_now })
    }
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.role.parse().map_err(|_| {
            DomainError::InternalError(format!("user {} has unknown role {}", row.id, row.role))
        })?;
        Ok(User {
            id: row.id,
            nickname: row.nickname,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            bio: row.bio,
            profile_picture_url: row.profile_picture_url,
            linkedin_profile_url: row.linkedin_profile_url,
            github_profile_url: row.github_profile_url,
            role,
            email_verified: row.email_verified,
            verification_token: row.verification_token,
            failed_login_attempts: row.failed_login_attempts,
            is_locked: row.is_locked,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    error!("Database error {}: {}", context, e);
    DomainError::DatabaseError(e.to_string())
}

/// Maps a unique-constraint name to the matching conflict.
fn conflict_for(constraint: Option<&str>, user: &User) -> Option<DomainError> {
    match constraint? {
        EMAIL_CONSTRAINT => Some(DomainError::EmailAlreadyExists(user.email.clone())),
        NICKNAME_CONSTRAINT => Some(DomainError::NicknameAlreadyExists(user.nickname.clone())),
        _ => None,
    }
}

fn write_error(context: &str, e: sqlx::Error, user: &User) -> DomainError {
    let conflict = e
        .as_database_error()
        .filter(|db| db.is_unique_violation())
        .and_then(|db| conflict_for(db.constraint(), user));
    match conflict {
        Some(conflict) => conflict,
        None => db_error(context, e),
    }
}

impl PgUserRepository {
    async fn find_one(&self, column: &str, value: &str) -> Result<Option<User>, DomainError> {
        let sql = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, column);
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("finding user", e))?;
        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("finding user by id", e))?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        self.find_one("email", email).await
    }

    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, DomainError> {
        self.find_one("nickname", nickname).await
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("counting users", e))?;
        Ok(count.max(0) as u64)
    }

    async fn create(&self, user: &User) -> Result<User, DomainError> {
        let sql = format!(
            r#"
            INSERT INTO users (
                id, nickname, email, password_hash,
                first_name, last_name, bio,
                profile_picture_url, linkedin_profile_url, github_profile_url,
                role, email_verified, verification_token,
                failed_login_attempts, is_locked, last_login_at,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let row: UserRow = sqlx::query_as(&sql)
            .bind(user.id)
            .bind(&user.nickname)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.bio)
            .bind(&user.profile_picture_url)
            .bind(&user.linkedin_profile_url)
            .bind(&user.github_profile_url)
            .bind(user.role.as_str())
            .bind(user.email_verified)
            .bind(&user.verification_token)
            .bind(user.failed_login_attempts)
            .bind(user.is_locked)
            .bind(user.last_login_at)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error("creating user", e, user))?;

        info!("User row created: {}", row.id);
        row.try_into()
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        // Lockout columns are owned by the single-statement methods below.
        let sql = format!(
            r#"
            UPDATE users
            SET
                nickname = $2,
                email = $3,
                password_hash = $4,
                first_name = $5,
                last_name = $6,
                bio = $7,
                profile_picture_url = $8,
                linkedin_profile_url = $9,
                github_profile_url = $10,
                role = $11,
                email_verified = $12,
                verification_token = $13,
                updated_at = $14
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(user.id)
            .bind(&user.nickname)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.bio)
            .bind(&user.profile_picture_url)
            .bind(&user.linkedin_profile_url)
            .bind(&user.github_profile_url)
            .bind(user.role.as_str())
            .bind(user.email_verified)
            .bind(&user.verification_token)
            .bind(user.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| write_error("updating user", e, user))?;

        row.ok_or(DomainError::UserNotFound)?.try_into()
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("deleting user", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<User>, DomainError> {
        let sql = format!(
            "SELECT {} FROM users ORDER BY created_at, id OFFSET $1 LIMIT $2",
            USER_COLUMNS
        );
        let rows: Vec<UserRow> = sqlx::query_as(&sql)
            .bind(i64::from(page.skip))
            .bind(i64::from(page.limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("listing users", e))?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn record_failed_login(
        &self,
        id: &Uuid,
        max_attempts: i32,
    ) -> Result<Option<FailedLogin>, DomainError> {
        // Right-hand sides see the pre-update row, so both columns derive
        // from the same counter value. `prev` captures the lock flag under
        // the row lock to report the transition.
        let sql = format!(
            r#"
            WITH prev AS (
                SELECT is_locked AS was_locked FROM users WHERE id = $1 FOR UPDATE
            )
            UPDATE users
            SET
                failed_login_attempts = failed_login_attempts + 1,
                is_locked = is_locked OR failed_login_attempts + 1 >= $2,
                updated_at = NOW()
            FROM prev
            WHERE users.id = $1
            RETURNING {}, prev.was_locked
            "#,
            qualified_columns()
        );
        let row: Option<FailedLoginRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(max_attempts)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("recording failed login", e))?;

        row.map(FailedLogin::try_from).transpose()
    }

    async fn record_successful_login(
        &self,
        id: &Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<User>, DomainError> {
        let sql = format!(
            r#"
            UPDATE users
            SET failed_login_attempts = 0, last_login_at = $2, updated_at = $2
            WHERE id = $1 AND NOT is_locked
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("recording login", e))?;

        row.map(User::try_from).transpose()
    }

    async fn unlock(&self, id: &Uuid) -> Result<Option<User>, DomainError> {
        let sql = format!(
            r#"
            UPDATE users
            SET is_locked = FALSE, failed_login_attempts = 0, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("unlocking user", e))?;

        row.map(User::try_from).transpose()
    }
}

//! Domain errors
//!
//! Expected failures (bad input, duplicates, unknown ids) never surface as
//! `DomainError` from the state manager; they become `Ok(None)` / `Ok(false)`.
//! What remains here is what a caller cannot recover from by fixing input.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("User not found")]
    UserNotFound,

    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("Nickname already exists: {0}")]
    NicknameAlreadyExists(String),

    #[error("Password hash error: {0}")]
    PasswordHashError(String),

    #[error("Unable to generate unique name")]
    UnableToGenerateUniqueName,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Conflicts the store reports for unique email/nickname constraints.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DomainError::EmailAlreadyExists(_) | DomainError::NicknameAlreadyExists(_)
        )
    }
}

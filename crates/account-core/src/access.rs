//! Caller identity and permission checks.

use uuid::Uuid;

use account_security::jwt::{Claims, JwtService};

use crate::domain::{Permission, UserRole};
use crate::error::DomainError;

/// The authenticated party performing an administrative call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn new(id: Uuid, role: UserRole) -> Self {
        Self { id, role }
    }

    pub fn from_claims(claims: &Claims) -> Result<Self, DomainError> {
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| DomainError::Unauthorized("Invalid subject claim".into()))?;
        let role = claims.role.parse()?;
        Ok(Self { id, role })
    }

    /// Decodes a bearer access token into an actor.
    pub fn from_token(jwt: &JwtService, token: &str) -> Result<Self, DomainError> {
        let claims = jwt
            .decode(token)
            .map_err(|e| DomainError::Unauthorized(e.to_string()))?;
        Self::from_claims(&claims)
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.role.permits(permission)
    }
}

pub fn require(actor: &Actor, permission: Permission) -> Result<(), DomainError> {
    if actor.can(permission) {
        Ok(())
    } else {
        Err(DomainError::Forbidden(format!(
            "{} may not perform {:?}",
            actor.role, permission
        )))
    }
}

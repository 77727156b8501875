// ============================================================================
// Account Core - Roles & Permissions
// File: crates/account-core/src/domain/role.rs
// ============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Fixed role set, ordered by privilege: Admin > Manager > Authenticated > Anonymous.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Anonymous,
    #[default]
    Authenticated,
    Manager,
    Admin,
}

/// Administrative actions gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ReadUsers,
    CreateUsers,
    UpdateUsers,
    ManageRoles,
    DeleteUsers,
    UnlockUsers,
    ResetPasswords,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Anonymous => "ANONYMOUS",
            UserRole::Authenticated => "AUTHENTICATED",
            UserRole::Manager => "MANAGER",
            UserRole::Admin => "ADMIN",
        }
    }

    pub fn privilege_level(&self) -> u8 {
        match self {
            UserRole::Anonymous => 0,
            UserRole::Authenticated => 1,
            UserRole::Manager => 2,
            UserRole::Admin => 3,
        }
    }

    pub fn has_at_least(&self, other: UserRole) -> bool {
        self.privilege_level() >= other.privilege_level()
    }

    /// Managers run day-to-day administration; deleting users and changing
    /// roles stay with admins.
    pub fn permits(&self, permission: Permission) -> bool {
        match permission {
            Permission::DeleteUsers | Permission::ManageRoles => *self == UserRole::Admin,
            Permission::ReadUsers
            | Permission::CreateUsers
            | Permission::UpdateUsers
            | Permission::UnlockUsers
            | Permission::ResetPasswords => self.has_at_least(UserRole::Manager),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ANONYMOUS" => Ok(UserRole::Anonymous),
            "AUTHENTICATED" => Ok(UserRole::Authenticated),
            "MANAGER" => Ok(UserRole::Manager),
            "ADMIN" => Ok(UserRole::Admin),
            _ => Err(DomainError::Unauthorized(format!("Unknown role: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_ordering() {
        assert!(UserRole::Admin.has_at_least(UserRole::Manager));
        assert!(UserRole::Manager.has_at_least(UserRole::Authenticated));
        assert!(!UserRole::Anonymous.has_at_least(UserRole::Authenticated));
    }

    #[test]
    fn test_permissions() {
        assert!(UserRole::Admin.permits(Permission::DeleteUsers));
        assert!(UserRole::Admin.permits(Permission::ManageRoles));
        assert!(UserRole::Manager.permits(Permission::UnlockUsers));
        assert!(!UserRole::Manager.permits(Permission::DeleteUsers));
        assert!(!UserRole::Manager.permits(Permission::ManageRoles));
        assert!(!UserRole::Authenticated.permits(Permission::ReadUsers));
        assert!(!UserRole::Anonymous.permits(Permission::CreateUsers));
    }

    #[test]
    fn test_default_role() {
        assert_eq!(UserRole::default(), UserRole::Authenticated);
    }

    #[test]
    fn test_parse() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("AUTHENTICATED".parse::<UserRole>().unwrap(), UserRole::Authenticated);
        assert!("root".parse::<UserRole>().is_err());
    }
}

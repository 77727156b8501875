//! # Account Core - Domain Module
//! 
//! Domain entities for the account subsystem.

pub mod notification;
pub mod role;
pub mod user;

// Re-export all entities and enums
pub use notification::{NotificationKind, NotificationRequest, TemplateFields, UnknownNotificationKind};
pub use role::{Permission, UserRole};
pub use user::{NewUser, User, UserUpdate};

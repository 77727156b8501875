//! # Account Core
//! 
//! Domain entities, services, notification gateway and repository traits
//! for the account subsystem.

pub mod access;
pub mod domain;
pub mod error;
pub mod nickname;
pub mod notifications;
pub mod repositories;
pub mod services;
pub mod validation;

// Re-export domain entities
pub use domain::*;
pub use error::DomainError;
pub use services::{AdminUserService, UserService};

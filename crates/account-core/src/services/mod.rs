//! Domain services (business logic)

pub mod admin_service;
pub mod user_service;

pub use admin_service::AdminUserService;
pub use user_service::UserService;

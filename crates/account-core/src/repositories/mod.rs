//! Repository traits (ports)

pub mod memory;
pub mod user_repository;

pub use memory::InMemoryUserRepository;
pub use user_repository::{FailedLogin, UserRepository};

#[cfg(test)]
pub use user_repository::MockUserRepository;

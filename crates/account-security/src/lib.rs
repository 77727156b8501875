//! # Account Security
//! 
//! Security utilities: password hashing and policy, JWT, verification tokens.

pub mod jwt;
pub mod password;
pub mod policy;
pub mod token;

pub use jwt::{Claims, JwtService};
pub use password::PasswordService;
pub use policy::{PasswordPolicy, PolicyError};

//! # Account Infrastructure
//! 
//! PostgreSQL storage, e-mail templates and SMTP delivery (adapters), plus
//! the composition root.

pub mod database;
pub mod notifications;
pub mod system;

pub use database::{create_pool, run_migrations, PgUserRepository};
pub use notifications::{MarkdownTemplateProvider, SmtpMailTransport};
pub use system::AccountSystem;

//! Configuration management

use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

use crate::error::AppError;
use crate::constants::{DEFAULT_ACCESS_TOKEN_EXPIRY, DEFAULT_MAX_LOGIN_ATTEMPTS};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub account: AccountSettings,
    pub smtp: SmtpSettings,
    pub templates: TemplateSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expiry: i64,
}

/// Policy knobs read by the account state manager.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AccountSettings {
    /// Failed logins that lock an account. The attempt that reaches this
    /// number is the one that locks.
    pub max_login_attempts: u32,
    /// Prefix for verification links, expected to end with `/`.
    pub server_base_url: String,
    /// Minimum zxcvbn score (0-4) a new password must reach, if set.
    #[serde(default)]
    pub min_password_strength: Option<u8>,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            max_login_attempts: DEFAULT_MAX_LOGIN_ATTEMPTS,
            server_base_url: "http://localhost:8000/".into(),
            min_password_strength: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
    pub starttls: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TemplateSettings {
    pub dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
    pub directory: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: true,
            directory: None,
        }
    }
}

impl AppConfig {
    /// Defaults, then `config/default`, then `config/{APP_ENV}`, then
    /// `__`-separated environment variables (after `.env` is read).
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let config = Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::default().separator("__").try_parsing(true))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Builder pre-populated with every default. `jwt.secret` and the SMTP
    /// credentials have none and must come from a file or the environment.
    pub fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("app.env", "development")?
            .set_default("app.name", "account-service")?
            .set_default("database.url", "postgres://localhost/accounts")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("jwt.access_token_expiry", DEFAULT_ACCESS_TOKEN_EXPIRY)?
            .set_default("account.max_login_attempts", DEFAULT_MAX_LOGIN_ATTEMPTS)?
            .set_default("account.server_base_url", "http://localhost:8000/")?
            .set_default("smtp.host", "localhost")?
            .set_default("smtp.port", 587)?
            .set_default("smtp.from_address", "no-reply@localhost")?
            .set_default("smtp.starttls", true)?
            .set_default("templates.dir", "email_templates")?
            .set_default("logging.level", "info")?
            .set_default("logging.json", true)
    }
}

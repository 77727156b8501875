//! Composition root wiring configuration, storage and mail delivery into the
//! account services.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use account_core::notifications::EmailService;
use account_core::services::{AdminUserService, UserService};
use account_security::JwtService;
use account_shared::telemetry::{init_telemetry, WorkerGuard};
use account_shared::AppConfig;

use crate::database::{create_pool, run_migrations, PgUserRepository};
use crate::notifications::{MarkdownTemplateProvider, SmtpMailTransport};

pub type Mailer = EmailService<MarkdownTemplateProvider, SmtpMailTransport>;

pub struct AccountSystem {
    pub users: Arc<UserService<PgUserRepository>>,
    pub admin: AdminUserService<PgUserRepository>,
    pub mailer: Arc<Mailer>,
    pub jwt: JwtService,
}

impl AccountSystem {
    /// Loads configuration, installs logging and builds the system. Hold the
    /// returned guard for the life of the process when file logging is on.
    pub async fn from_env() -> anyhow::Result<(Self, Option<WorkerGuard>)> {
        let config = AppConfig::load().context("loading configuration")?;
        let guard = init_telemetry(&config.logging).context("initialising telemetry")?;
        let system = Self::build(&config).await?;
        Ok((system, guard))
    }

    pub async fn build(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = create_pool(&config.database)
            .await
            .context("connecting to database")?;
        run_migrations(&pool).await.context("running migrations")?;

        let renderer = MarkdownTemplateProvider::from_dir(&config.templates.dir)
            .context("loading email templates")?;
        let transport = SmtpMailTransport::new(&config.smtp).context("configuring SMTP")?;
        let mailer = Arc::new(EmailService::new(
            Arc::new(renderer),
            Arc::new(transport),
            config.account.server_base_url.clone(),
        ));

        let users = Arc::new(
            UserService::new(Arc::new(PgUserRepository::new(pool)), config.account.clone())
                .with_notifier(mailer.clone()),
        );

        info!(
            "Account system ready (lock after {} failed logins)",
            config.account.max_login_attempts
        );

        Ok(Self {
            admin: AdminUserService::new(users.clone()),
            users,
            mailer,
            jwt: JwtService::new(config.jwt.secret.clone(), config.jwt.access_token_expiry),
        })
    }
}

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use gatehouse_auth::{Authenticator, LogNotifier, VerificationNotifier};
use gatehouse_config::AppConfig;
use gatehouse_database::initialize_database;
use gatehouse_mailer::SmtpNotifier;
use sqlx::SqlitePool;
use tracing::{info, warn};

pub mod telemetry {
    use anyhow::Result;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

#[derive(Clone)]
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub authenticator: Authenticator,
    pub notifier: Arc<dyn VerificationNotifier>,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let db_pool = initialize_database(&config.database)
            .await
            .context("failed to initialise database")?;

        let notifier = build_notifier(config)?;
        let authenticator =
            Authenticator::new(db_pool.clone(), config.auth.clone(), notifier.clone());

        info!(
            mail_enabled = config.mail.enabled,
            email_only_verification = config.auth.allow_email_only_verification,
            "backend services ready"
        );

        Ok(Self {
            db_pool,
            authenticator,
            notifier,
        })
    }
}

fn build_notifier(config: &AppConfig) -> Result<Arc<dyn VerificationNotifier>> {
    if !config.mail.enabled {
        warn!("mail delivery disabled; verification messages are only logged");
        return Ok(Arc::new(LogNotifier));
    }

    let notifier =
        SmtpNotifier::from_config(&config.mail).context("failed to configure mail transport")?;
    info!(host = %config.mail.smtp_host, port = config.mail.smtp_port, "smtp notifier configured");
    Ok(Arc::new(notifier))
}

/// Refuse the built-in development secret unless explicitly allowed.
pub fn check_jwt_secret(config: &AppConfig, allow_dev_secret: bool) -> Result<()> {
    if !config.auth.uses_development_secret() {
        return Ok(());
    }
    if allow_dev_secret {
        warn!("using the development JWT secret; never do this in production");
        return Ok(());
    }
    bail!(
        "refusing to start with the development JWT secret; \
         set GATEHOUSE__AUTH__JWT_SECRET or pass --allow-dev-secret"
    )
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}

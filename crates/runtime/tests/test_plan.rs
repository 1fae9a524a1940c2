use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use gatehouse_auth::{LoginRequest, RegistrationRequest};
use gatehouse_config::AppConfig;
use gatehouse_runtime::{self, check_jwt_secret, BackendServices};
use tempfile::TempDir;
use tokio::time::{sleep, timeout};

fn sqlite_url(path: &Path) -> String {
    format!("sqlite://{}", path.to_string_lossy())
}

fn build_config(database_url: String, max_connections: u32) -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = database_url;
    config.database.max_connections = max_connections;
    config.auth.jwt_secret = "runtime-test-secret".into();
    config
}

async fn initialise(config: &AppConfig) -> Result<BackendServices> {
    BackendServices::initialise(config)
        .await
        .context("failed to initialise backend services")
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_runs_migrations() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("runtime/init.db");
    let config = build_config(sqlite_url(&db_path), 4);

    let services = initialise(&config).await?;
    let table: String = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'identities'",
    )
    .fetch_one(&services.db_pool)
    .await?;
    assert_eq!("identities", table);
    assert_eq!(4, services.db_pool.options().get_max_connections());
    assert!(db_path.exists(), "sqlite database file should be created");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn services_wire_a_working_authenticator() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut config = build_config(sqlite_url(&temp_dir.path().join("wired.db")), 2);
    config.auth.allow_email_only_verification = true;

    let services = initialise(&config).await?;
    let authenticator = &services.authenticator;

    authenticator
        .register(RegistrationRequest {
            email: "a@x.com".into(),
            username: "alice".into(),
            password: "pw123456".into(),
            name: "Alice Example".into(),
            phone: None,
            user_type: "User".into(),
            department: None,
        })
        .await?;
    authenticator
        .verify_email(gatehouse_auth::VerificationProof::Email("a@x.com".into()))
        .await?;
    let outcome = authenticator
        .login(LoginRequest {
            email: "a@x.com".into(),
            password: "pw123456".into(),
        })
        .await?;
    assert!(!outcome.token.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_rejects_incomplete_smtp_credentials() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut config = build_config(sqlite_url(&temp_dir.path().join("mail.db")), 1);
    config.mail.enabled = true;
    config.mail.username = Some("mailer".into());
    config.mail.password = None;

    let error = match BackendServices::initialise(&config).await {
        Ok(_) => panic!("expected mail configuration to be rejected"),
        Err(error) => error,
    };
    assert!(
        format!("{error:#}").contains("failed to configure mail transport"),
        "unexpected error: {error:#}"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_accepts_insecure_smtp_for_development() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut config = build_config(sqlite_url(&temp_dir.path().join("dev-mail.db")), 1);
    config.mail.enabled = true;
    config.mail.insecure = true;
    config.mail.smtp_host = "127.0.0.1".into();
    config.mail.smtp_port = 1025;

    initialise(&config).await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn in_memory_database_is_supported() -> Result<()> {
    let config = build_config("sqlite://:memory:".into(), 4);
    let services = initialise(&config).await?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM identities")
        .fetch_one(&services.db_pool)
        .await?;
    assert_eq!(0, count);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_reports_unreachable_database_paths() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let blocker = temp_dir.path().join("file-not-dir");
    std::fs::write(&blocker, b"")?;
    let config = build_config(sqlite_url(&blocker.join("nested.db")), 1);

    let error = match BackendServices::initialise(&config).await {
        Ok(_) => panic!("expected database initialisation to fail"),
        Err(error) => error,
    };
    assert!(
        format!("{error:#}").contains("failed to initialise database"),
        "unexpected error: {error:#}"
    );
    Ok(())
}

#[test]
fn development_secret_requires_explicit_opt_in() {
    let config = AppConfig::default();
    assert!(check_jwt_secret(&config, false).is_err());
    assert!(check_jwt_secret(&config, true).is_ok());

    let configured = build_config("sqlite://:memory:".into(), 1);
    assert!(check_jwt_secret(&configured, false).is_ok());
}

#[test]
fn telemetry_init_tracing_sets_global_subscriber() {
    gatehouse_runtime::telemetry::init_tracing().expect("first initialisation should succeed");

    let second = gatehouse_runtime::telemetry::init_tracing();
    assert!(
        second.is_err(),
        "initialising telemetry twice should fail with global subscriber already set"
    );
}

#[tokio::test(flavor = "multi_thread")]
#[cfg_attr(not(unix), ignore = "requires Unix signal handling")]
async fn shutdown_signal_completes_on_ctrl_c_notification() -> Result<()> {
    let shutdown_task = tokio::spawn(async { gatehouse_runtime::shutdown_signal().await });

    sleep(Duration::from_millis(50)).await;
    #[cfg(unix)]
    unsafe {
        libc::raise(libc::SIGINT);
    }

    timeout(Duration::from_secs(2), shutdown_task).await??;
    Ok(())
}

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "gatehouse.toml",
    "config/gatehouse.toml",
    "crates/config/gatehouse.toml",
    "../gatehouse.toml",
    "../config/gatehouse.toml",
];

/// Secret used when nothing else is configured. The server refuses to start
/// with it unless explicitly told to.
pub const DEVELOPMENT_JWT_SECRET: &str = "gatehouse-development-secret-change-me";

/// Upper bound for token lifetimes (ten years).
pub const MAX_TTL_SECONDS: u64 = 10 * 365 * 86_400;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 7070,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://gatehouse.db".to_string(),
            max_connections: 10,
        }
    }
}

/// Token signing and verification-flow settings.
///
/// ```
/// use gatehouse_config::AuthConfig;
///
/// let auth = AuthConfig::default();
/// assert_eq!(auth.session_ttl_seconds, 86_400);
/// assert_eq!(auth.verification_ttl_seconds, 86_400);
/// assert!(!auth.allow_email_only_verification);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: String,
    pub audience: String,
    pub session_ttl_seconds: u64,
    pub verification_ttl_seconds: u64,
    /// Accept `{ "email": ... }` as a verification proof without a signed token.
    pub allow_email_only_verification: bool,
}

impl AuthConfig {
    pub fn uses_development_secret(&self) -> bool {
        self.jwt_secret == DEVELOPMENT_JWT_SECRET
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
            issuer: "gatehouse".to_string(),
            audience: "gatehouse-clients".to_string(),
            session_ttl_seconds: 86_400,
            verification_ttl_seconds: 86_400,
            allow_email_only_verification: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// When disabled, verification messages are only logged.
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
    pub from_name: String,
    pub frontend_url: String,
    pub insecure: bool,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            username: None,
            password: None,
            from_address: "no-reply@gatehouse.local".to_string(),
            from_name: "Gatehouse".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            insecure: false,
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use gatehouse_config::load;
///
/// std::env::remove_var("GATEHOUSE_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let mut builder = config::Config::builder();

    let environment_overrides = config::Environment::with_prefix("GATEHOUSE")
        .prefix_separator("__")
        .separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("GATEHOUSE_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via GATEHOUSE_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    validate_ttl("auth.session_ttl_seconds", config.auth.session_ttl_seconds)?;
    validate_ttl("auth.verification_ttl_seconds", config.auth.verification_ttl_seconds)?;

    debug!(
        http = ?config.http,
        database = %config.database.url,
        mail_enabled = config.mail.enabled,
        "loaded gatehouse configuration"
    );
    Ok(config)
}

fn validate_ttl(name: &str, seconds: u64) -> anyhow::Result<()> {
    if !(1..=MAX_TTL_SECONDS).contains(&seconds) {
        anyhow::bail!(
            "invalid configuration: {name} must be between 1 and {MAX_TTL_SECONDS} seconds, got {seconds}"
        );
    }
    Ok(())
}

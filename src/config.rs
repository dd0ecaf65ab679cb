use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// The log level to use, this is a tracing env filter
    pub level: String,

    /// Emit logs as json instead of human readable text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Bind address for the API server
    pub bind_address: SocketAddr,

    /// The name the service advertises about itself
    pub name: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "[::]:4000".parse().expect("failed to parse bind address"),
            name: "murmur-api".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseMode {
    Postgres,
    Memory,
}

impl FromStr for DatabaseMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            _ => anyhow::bail!("unknown database mode: {}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Which store backend to run against
    pub mode: DatabaseMode,

    /// The database URI to use when mode is postgres
    pub uri: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            mode: DatabaseMode::Postgres,
            uri: "postgres://root@localhost:5432/murmur_dev".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MailerConfig {
    /// The mail API endpoint to POST transactional email to
    pub endpoint: String,

    /// The mail API key, sent as the api-key header
    pub api_key: String,

    /// Sender address for verification email
    pub sender_email: String,

    /// Sender display name for verification email
    pub sender_name: String,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.brevo.com/v3/smtp/email".to_string(),
            api_key: "".to_string(),
            sender_email: "no-reply@murmur.app".to_string(),
            sender_name: "Murmur".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// JWT secret
    pub secret: String,

    /// JWT issuer
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "murmur".to_string(),
            issuer: "murmur".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Refuse logins from accounts that have not verified their email
    pub require_verified_login: bool,

    /// How long a verification code stays valid, in seconds
    pub verification_code_ttl_secs: u64,

    /// How long a session token stays valid, in seconds
    pub session_duration_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            require_verified_login: false,
            verification_code_ttl_secs: 3600,
            session_duration_secs: 60 * 60 * 24 * 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// The path of the config file this config was loaded from, if any
    pub config_file: Option<String>,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Mail API configuration
    pub mailer: MailerConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Account policy configuration
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Loads the config: defaults, then the json config file (the path in
    /// `MURMUR_CONFIG`, or `config.json` if it exists), then `MURMUR_*`
    /// environment overrides.
    pub fn parse() -> Result<Self> {
        let (path, explicit) = match std::env::var("MURMUR_CONFIG") {
            Ok(path) => (PathBuf::from(path), true),
            Err(_) => (PathBuf::from("config.json"), false),
        };

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            let mut config: AppConfig = serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse config file {}", path.display()))?;
            config.config_file = Some(path.display().to_string());
            config
        } else if explicit {
            anyhow::bail!("config file {} does not exist", path.display());
        } else {
            AppConfig::default()
        };

        config.apply_env_overrides()?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(level) = std::env::var("MURMUR_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(addr) = std::env::var("MURMUR_BIND_ADDRESS") {
            self.api.bind_address = addr
                .parse()
                .context("MURMUR_BIND_ADDRESS is not a valid socket address")?;
        }

        if let Ok(mode) = std::env::var("MURMUR_DATABASE_MODE") {
            self.database.mode = mode.parse()?;
        }

        if let Ok(uri) = std::env::var("MURMUR_DATABASE_URI") {
            self.database.uri = uri;
        }

        if let Ok(endpoint) = std::env::var("MURMUR_MAILER_ENDPOINT") {
            self.mailer.endpoint = endpoint;
        }

        if let Ok(api_key) = std::env::var("MURMUR_MAILER_API_KEY") {
            self.mailer.api_key = api_key;
        }

        if let Ok(sender) = std::env::var("MURMUR_MAILER_SENDER_EMAIL") {
            self.mailer.sender_email = sender;
        }

        if let Ok(secret) = std::env::var("MURMUR_JWT_SECRET") {
            self.jwt.secret = secret;
        }

        if let Ok(issuer) = std::env::var("MURMUR_JWT_ISSUER") {
            self.jwt.issuer = issuer;
        }

        if let Ok(require) = std::env::var("MURMUR_REQUIRE_VERIFIED_LOGIN") {
            self.auth.require_verified_login = require
                .parse()
                .context("MURMUR_REQUIRE_VERIFIED_LOGIN must be true or false")?;
        }

        Ok(())
    }
}

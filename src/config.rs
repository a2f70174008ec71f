use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub tokens: TokenConfig,

    pub smtp: SmtpConfig,

    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/plantdesk.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on the rotation cookie.
    /// Default: true for production safety. Set to false for local
    /// development without HTTPS.
    pub secure_cookies: bool,

    /// External base URL, used to build password-reset links.
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 6700,
            cors_allowed_origins: vec![
                "http://localhost:6700".to_string(),
                "http://127.0.0.1:6700".to_string(),
            ],
            secure_cookies: true,
            public_url: "http://localhost:6700".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// HMAC key for access tokens. Override via PLANTDESK_ACCESS_KEY.
    pub access_key: String,

    /// HMAC key for rotation tokens. Override via PLANTDESK_ROTATION_KEY.
    pub rotation_key: String,

    pub access_ttl_minutes: i64,

    pub rotation_ttl_hours: i64,

    pub reset_ttl_hours: i64,

    /// Issuer shown in authenticator apps for TOTP enrolment.
    pub totp_issuer: String,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_key: "dev-access-key-change-me".to_string(),
            rotation_key: "dev-rotation-key-change-me".to_string(),
            access_ttl_minutes: 15,
            rotation_ttl_hours: 24,
            reset_ttl_hours: 24,
            totp_issuer: "plantdesk".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub enabled: bool,

    pub host: String,

    pub port: u16,

    pub username: String,

    /// Override via PLANTDESK_SMTP_PASSWORD rather than the config file.
    pub password: String,

    pub from: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "localhost".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from: "plantdesk <no-reply@localhost>".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub hr_base_url: String,

    /// Session cookie the HR directory expects; rotated by hand when the
    /// upstream invalidates it.
    pub hr_session_cookie: String,

    pub currency_url: String,

    /// Request timeout in seconds for both catalogs (default: 10)
    pub timeout_seconds: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            hr_base_url: "https://hr.example.com/api/employees".to_string(),
            hr_session_cookie: String::new(),
            currency_url: "https://currencies.example.com/api/catalog".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Secrets and deploy-specific values come from the environment and
    /// win over the config file.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("PLANTDESK_DATABASE") {
            self.general.database_path = v;
        }
        if let Ok(v) = std::env::var("PLANTDESK_PORT")
            && let Ok(port) = v.parse()
        {
            self.server.port = port;
        }
        if let Ok(v) = std::env::var("PLANTDESK_CORS_ORIGINS") {
            self.server.cors_allowed_origins =
                v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = std::env::var("PLANTDESK_ACCESS_KEY") {
            self.tokens.access_key = v;
        }
        if let Ok(v) = std::env::var("PLANTDESK_ROTATION_KEY") {
            self.tokens.rotation_key = v;
        }
        if let Ok(v) = std::env::var("PLANTDESK_SMTP_HOST") {
            self.smtp.host = v;
            self.smtp.enabled = true;
        }
        if let Ok(v) = std::env::var("PLANTDESK_SMTP_PORT")
            && let Ok(port) = v.parse()
        {
            self.smtp.port = port;
        }
        if let Ok(v) = std::env::var("PLANTDESK_SMTP_USERNAME") {
            self.smtp.username = v;
        }
        if let Ok(v) = std::env::var("PLANTDESK_SMTP_PASSWORD") {
            self.smtp.password = v;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("plantdesk").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".plantdesk").join("config.toml"));
        }

        paths
    }

    pub fn validate(&self) -> Result<()> {
        if self.tokens.access_key.is_empty() || self.tokens.rotation_key.is_empty() {
            anyhow::bail!("Token signing keys cannot be empty");
        }

        if self.tokens.access_key == self.tokens.rotation_key {
            anyhow::bail!("Access and rotation tokens must use independent keys");
        }

        if self.tokens.access_ttl_minutes <= 0 || self.tokens.rotation_ttl_hours <= 0 {
            anyhow::bail!("Token lifetimes must be positive");
        }

        if self.smtp.enabled && self.smtp.host.is_empty() {
            anyhow::bail!("SMTP host cannot be empty when SMTP is enabled");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn identical_keys_are_rejected() {
        let mut config = Config::default();
        config.tokens.rotation_key = config.tokens.access_key.clone();
        assert!(config.validate().is_err());
    }
}

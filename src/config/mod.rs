use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_WINDOW_MINUTES: u32 = 15;

/// Deployment configuration, loaded from a TOML file at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// The single administrator credential. There is no user table.
    pub admin_password: String,
    /// Secondary credential that skips the throttle entirely; exists to
    /// recover from lockouts.
    pub bypass_token: Option<String>,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u32,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_window_minutes() -> u32 {
    DEFAULT_WINDOW_MINUTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.auth.admin_password.is_empty() {
            return Err(Error::Config("auth.admin_password must not be empty".into()));
        }
        if self.auth.max_attempts == 0 {
            return Err(Error::Config("auth.max_attempts must be at least 1".into()));
        }
        if self.auth.window_minutes == 0 {
            return Err(Error::Config("auth.window_minutes must be at least 1".into()));
        }
        Ok(())
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("invalid listen address: {e}")))
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("sharebox.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config: Config = toml::from_str(
            r#"
            [auth]
            admin_password = "s3cret"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.max_attempts, 5);
        assert_eq!(config.auth.window_minutes, 15);
        assert!(config.auth.bypass_token.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_full_config_round_trip() {
        let config: Config = toml::from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000
            data_dir = "/var/lib/sharebox"

            [auth]
            admin_password = "s3cret"
            bypass_token = "rescue"
            max_attempts = 10
            window_minutes = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.db_path(), PathBuf::from("/var/lib/sharebox/sharebox.db"));
        assert_eq!(config.auth.bypass_token.as_deref(), Some("rescue"));
        assert_eq!(config.auth.max_attempts, 10);
    }

    #[test]
    fn test_empty_admin_password_is_rejected() {
        let config: Config = toml::from_str(
            r#"
            [auth]
            admin_password = ""
            "#,
        )
        .unwrap();

        assert!(config.validate().is_err());
    }
}

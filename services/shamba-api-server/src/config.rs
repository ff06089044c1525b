//! Server Configuration
//!
//! Layered configuration for the Shamba API server: optional file,
//! `config/default`, `config/local`, then `SHAMBA__*` environment
//! variables. CLI flags are applied on top in `main`.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use shamba_api::ApiConfig;
use shamba_auth::{AuthConfig, JwtConfig, PasswordConfig, PLACEHOLDER_SECRET};
use shamba_db::DatabaseConfig;

/// Server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server binding configuration
    pub server: ServerSettings,
    /// PostgreSQL connection settings
    pub database: DatabaseConfig,
    /// Authentication configuration
    pub auth: AuthSettings,
    /// Where uploaded images are stored
    pub uploads: UploadSettings,
    /// HTTP layer settings
    pub api: ApiSettings,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// Server binding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Grace period for in-flight requests after a shutdown signal
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            shutdown_timeout_secs: 10,
        }
    }
}

impl ServerSettings {
    /// Socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address {}: {}", addr, e))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Authentication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HMAC secret for signing tokens
    pub jwt_secret: String,
    /// Token lifetime in seconds
    pub token_lifetime_secs: u64,
    /// Argon2 memory cost in KiB
    pub password_memory_cost: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        let jwt = JwtConfig::default();
        Self {
            jwt_secret: jwt.secret,
            token_lifetime_secs: jwt.token_lifetime.as_secs(),
            password_memory_cost: PasswordConfig::default().memory_cost,
        }
    }
}

impl AuthSettings {
    pub fn uses_placeholder_secret(&self) -> bool {
        self.jwt_secret == PLACEHOLDER_SECRET
    }

    /// Expand into the auth service configuration
    pub fn to_auth_config(&self) -> AuthConfig {
        AuthConfig {
            jwt: JwtConfig {
                secret: self.jwt_secret.clone(),
                token_lifetime: Duration::from_secs(self.token_lifetime_secs),
                ..Default::default()
            },
            password: PasswordConfig {
                memory_cost: self.password_memory_cost,
                ..Default::default()
            },
        }
    }
}

/// Upload storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    pub dir: PathBuf,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
        }
    }
}

/// API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub enable_cors: bool,
    /// Allowed origins; `*` allows any
    pub cors_origins: Vec<String>,
    pub enable_compression: bool,
    pub enable_tracing: bool,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ApiSettings {
    fn default() -> Self {
        let api = ApiConfig::default();
        Self {
            enable_cors: api.enable_cors,
            cors_origins: api.cors_origins,
            enable_compression: api.enable_compression,
            enable_tracing: api.enable_tracing,
            max_body_size: api.max_body_size,
        }
    }
}

impl From<&ApiSettings> for ApiConfig {
    fn from(settings: &ApiSettings) -> Self {
        Self {
            enable_cors: settings.enable_cors,
            cors_origins: settings.cors_origins.clone(),
            enable_compression: settings.enable_compression,
            enable_tracing: settings.enable_tracing,
            max_body_size: settings.max_body_size,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Serve Prometheus metrics on a separate port
    pub enabled: bool,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9090,
        }
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

impl ServerConfig {
    /// Load configuration from files and environment
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("SHAMBA")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.uploads.dir, PathBuf::from("uploads"));
        assert!(config.auth.uses_placeholder_secret());
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_socket_addr() {
        let settings = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Default::default()
        };
        assert_eq!(settings.socket_addr().unwrap().port(), 8080);

        let bad = ServerSettings {
            host: "not a host".to_string(),
            ..Default::default()
        };
        assert!(bad.socket_addr().is_err());
    }

    #[test]
    fn test_auth_config_expansion() {
        let settings = AuthSettings {
            jwt_secret: "a-real-secret-that-is-long-enough-32b".to_string(),
            token_lifetime_secs: 60,
            password_memory_cost: 4096,
        };
        let auth = settings.to_auth_config();
        assert_eq!(auth.jwt.token_lifetime, Duration::from_secs(60));
        assert_eq!(auth.password.memory_cost, 4096);
        assert!(!settings.uses_placeholder_secret());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shamba.toml");
        std::fs::write(
            &path,
            "[server]\nport = 7000\n\n[uploads]\ndir = \"/var/shamba/uploads\"\n",
        )
        .unwrap();

        let config = ServerConfig::load(path.to_str()).unwrap();
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.uploads.dir, PathBuf::from("/var/shamba/uploads"));
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_api_settings_into_api_config() {
        let settings = ApiSettings {
            cors_origins: vec!["https://shamba.co.ke".to_string()],
            ..Default::default()
        };
        let api = ApiConfig::from(&settings);
        assert_eq!(api.cors_origins, vec!["https://shamba.co.ke".to_string()]);
        assert_eq!(api.max_body_size, settings.max_body_size);
    }
}

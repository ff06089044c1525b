//! Shamba API Server
//!
//! HTTP server for the Shamba farm marketplace.
//!
//! # Usage
//!
//! ```bash
//! # PostgreSQL from DATABASE_URL, port 5000
//! JWT_SECRET=... shamba-api-server
//!
//! # Custom config file
//! shamba-api-server --config /etc/shamba/server.toml
//!
//! # Local development on in-memory stores
//! shamba-api-server --dev-mode --in-memory
//!
//! # Environment overrides
//! SHAMBA__SERVER__PORT=8080 shamba-api-server
//! ```

mod config;

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tokio::sync::Notify;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shamba_api::{create_router, ApiConfig, AppState, ImageStore};
use shamba_auth::AuthService;
use shamba_db::Database;

use crate::config::ServerConfig;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Shamba API Server
#[derive(Parser, Debug)]
#[command(name = "shamba-api-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML, JSON, or YAML)
    #[arg(short, long, env = "SHAMBA_CONFIG")]
    config: Option<String>,

    /// Host to bind to
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SHAMBA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, env = "SHAMBA_LOG_FORMAT")]
    log_format: Option<String>,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// JWT secret key
    #[arg(long, env = "JWT_SECRET")]
    jwt_secret: Option<String>,

    /// Directory for uploaded images
    #[arg(long, env = "UPLOAD_DIR")]
    upload_dir: Option<PathBuf>,

    /// Use in-memory stores instead of PostgreSQL
    #[arg(long, env = "SHAMBA_IN_MEMORY")]
    in_memory: bool,

    /// Enable development mode (allows the placeholder JWT secret)
    #[arg(long, env = "SHAMBA_DEV_MODE")]
    dev_mode: bool,
}

impl Args {
    /// CLI flags win over file and `SHAMBA__*` settings
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }
        if let Some(secret) = &self.jwt_secret {
            config.auth.jwt_secret = secret.clone();
        }
        if let Some(dir) = &self.upload_dir {
            config.uploads.dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.clone();
        }
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut server_config = ServerConfig::load(args.config.as_deref())?;
    args.apply(&mut server_config);

    init_logging(&server_config.logging);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Shamba API Server"
    );

    validate_config(&server_config, args.dev_mode)?;

    let db = init_database(&server_config, args.in_memory).await?;
    let auth = Arc::new(AuthService::new(
        db.clone(),
        server_config.auth.to_auth_config(),
    ));

    let images = ImageStore::new(&server_config.uploads.dir);
    images.prepare().await.map_err(|e| {
        anyhow::anyhow!(
            "Cannot create upload directory {}: {}",
            server_config.uploads.dir.display(),
            e
        )
    })?;
    tracing::info!(dir = %server_config.uploads.dir.display(), "Upload directory ready");

    let state = Arc::new(AppState::new(db, auth, images));
    let app = create_router(state, ApiConfig::from(&server_config.api));

    if server_config.metrics.enabled {
        start_metrics_server(server_config.metrics.port)?;
    }

    let addr = server_config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        host = %server_config.server.host,
        port = %server_config.server.port,
        "Server listening"
    );

    let stopping = Arc::new(Notify::new());
    let server = axum::serve(listener, app).with_graceful_shutdown({
        let stopping = stopping.clone();
        async move {
            shutdown_signal().await;
            stopping.notify_one();
        }
    });

    let timeout = server_config.server.shutdown_timeout();
    tokio::select! {
        result = server.into_future() => result?,
        _ = async {
            stopping.notified().await;
            tokio::time::sleep(timeout).await;
        } => {
            tracing::warn!(
                timeout_secs = timeout.as_secs(),
                "In-flight requests did not finish in time"
            );
        }
    }

    tracing::info!("Server shutdown complete");

    Ok(())
}

// =============================================================================
// Initialization Functions
// =============================================================================

/// Initialize tracing/logging
fn init_logging(config: &config::LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => subscriber
            .with(fmt::layer().json().with_target(true))
            .init(),
        _ => subscriber
            .with(fmt::layer().pretty().with_target(true))
            .init(),
    }
}

/// Reject settings that must not reach production
fn validate_config(config: &ServerConfig, dev_mode: bool) -> anyhow::Result<()> {
    if config.auth.uses_placeholder_secret() {
        if !dev_mode {
            anyhow::bail!(
                "JWT secret must be changed in production. Set JWT_SECRET environment variable."
            );
        }
        tracing::warn!("Using the placeholder JWT secret (dev mode)");
    }

    if config.server.port == 0 {
        tracing::warn!("Port 0 requested; the OS will pick a free port");
    }

    Ok(())
}

/// Connect the store and apply migrations
async fn init_database(config: &ServerConfig, in_memory: bool) -> anyhow::Result<Arc<Database>> {
    if in_memory {
        tracing::warn!("Using in-memory stores; data is lost on restart");
        return Ok(Arc::new(Database::new_mock()));
    }

    let db = Database::connect(&config.database).await?;

    if config.database.run_migrations {
        db.migrate().await?;
    }

    let health = db.health_check().await?;
    if !health.healthy {
        anyhow::bail!("Database health check failed");
    }

    tracing::info!(postgres = ?health.postgres, "Database health check passed");

    Ok(Arc::new(db))
}

/// Install the Prometheus recorder with its own HTTP listener
fn start_metrics_server(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(port = port, "Metrics server started");

    Ok(())
}

// =============================================================================
// Graceful Shutdown
// =============================================================================

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(["shamba-api-server", "--port", "8080", "--in-memory"]);
        assert_eq!(args.port, Some(8080));
        assert!(args.in_memory);
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "shamba-api-server",
            "--jwt-secret",
            "a-real-secret-that-is-long-enough-32b",
            "--upload-dir",
            "/srv/uploads",
            "--log-format",
            "json",
        ]);
        let mut config = ServerConfig::default();
        args.apply(&mut config);

        assert_eq!(config.uploads.dir, PathBuf::from("/srv/uploads"));
        assert_eq!(config.logging.format, "json");
        assert!(!config.auth.uses_placeholder_secret());
    }

    #[test]
    fn test_placeholder_secret_needs_dev_mode() {
        let config = ServerConfig::default();
        assert!(validate_config(&config, false).is_err());
        assert!(validate_config(&config, true).is_ok());
    }
}

//! Application settings and configuration structures.

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Database configuration (PostgreSQL)
    pub database: DatabaseSettings,

    /// JWT authentication settings
    pub jwt: JwtSettings,

    /// Heartbeat and liveness sweep configuration
    pub presence: PresenceSettings,

    /// Deduplication windows
    pub dedup: DedupSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// WebSocket configuration
    pub websocket: WebSocketSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// PostgreSQL database configuration.
///
/// When `url` is unset the server runs against the in-memory stores.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    pub url: Option<String>,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,

    /// Apply pending migrations on startup
    pub run_migrations: bool,
}

/// JWT authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for verifying (and, in tooling, signing) tokens
    pub secret: String,

    /// Access token expiry in minutes
    pub access_token_expiry_minutes: i64,
}

/// Presence tracking configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PresenceSettings {
    /// Interval clients are told to heartbeat at
    pub heartbeat_interval_ms: u64,

    /// Time since the last heartbeat after which a user is presumed offline
    pub liveness_threshold_ms: u64,

    /// Period of the liveness sweep
    pub sweep_interval_ms: u64,
}

/// Deduplication windows.
#[derive(Debug, Clone, Deserialize)]
pub struct DedupSettings {
    /// Server-side window for identical resubmissions
    pub send_window_secs: u64,

    /// Client-side window for redundant deliveries
    pub delivery_window_secs: u64,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env)
    pub allowed_origins: Vec<String>,
}

/// WebSocket configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketSettings {
    /// Maximum message size in bytes (default: 64KB)
    pub max_message_size: usize,
}

/// Minimum required length for JWT secret (256 bits = 32 bytes)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. Built-in defaults
    /// 2. config/default.toml
    /// 3. config/{RUN_ENV}.toml
    /// 4. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if the resulting values are inconsistent.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 4000)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("database.run_migrations", true)?
            .set_default("jwt.access_token_expiry_minutes", 60 * 24)?
            .set_default("presence.heartbeat_interval_ms", 25_000_i64)?
            .set_default("presence.liveness_threshold_ms", 60_000_i64)?
            .set_default("presence.sweep_interval_ms", 30_000_i64)?
            .set_default("dedup.send_window_secs", 10)?
            .set_default("dedup.delivery_window_secs", 60)?
            .set_default("cors.allowed_origins", vec!["http://localhost:4200"])?
            .set_default("websocket.max_message_size", 65536_i64)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__PRESENCE__SWEEP_INTERVAL_MS=5000 -> presence.sweep_interval_ms = 5000
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("jwt.secret", std::env::var("JWT_SECRET").ok())?
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| settings.validate().map(|()| settings))
    }

    /// Reject configurations that would make presence or auth misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::Message(format!(
                "JWT secret must be at least {} characters for security. Current length: {}",
                MIN_JWT_SECRET_LENGTH,
                self.jwt.secret.len()
            )));
        }

        if self.presence.heartbeat_interval_ms >= self.presence.liveness_threshold_ms {
            return Err(ConfigError::Message(format!(
                "presence.heartbeat_interval_ms ({}) must be shorter than presence.liveness_threshold_ms ({})",
                self.presence.heartbeat_interval_ms, self.presence.liveness_threshold_ms
            )));
        }

        if self.presence.sweep_interval_ms == 0 {
            return Err(ConfigError::Message(
                "presence.sweep_interval_ms must be greater than zero".into(),
            ));
        }

        Ok(())
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl PresenceSettings {
    pub fn liveness_threshold(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.liveness_threshold_ms as i64)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl DedupSettings {
    pub fn send_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.send_window_secs as i64)
    }

    pub fn delivery_window(&self) -> Duration {
        Duration::from_secs(self.delivery_window_secs)
    }
}

use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Free-form deployment name reported by the health check (e.g. "development").
    pub environment: String,
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub rate_limit: RateLimitSettings,
    pub log: LogSettings,
}

/// Where the HTTP listener binds.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::ValidationError(format!("invalid server address: {e}")))
    }
}

/// Connection pool and per-statement deadline for the PostgreSQL store.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    /// Deadline applied to every query and to every transaction as a whole.
    pub query_timeout_secs: u64,
}

impl DatabaseSettings {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

/// Signing secret and lifetime of issued bearer tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    pub secret: String,
    pub token_ttl_hours: i64,
}

/// Largest accepted `rate_limit.requests_per_second`. Above it the refill
/// interval would drop below a microsecond.
pub const MAX_REQUESTS_PER_SECOND: u32 = 1_000_000;

/// Per-client request throttling. State is process-local.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    pub enabled: bool,
    /// Steady-state allowance; one token arrives every `1 / requests_per_second`.
    pub requests_per_second: u32,
    /// Clients unseen for longer than this are forgotten.
    pub idle_timeout_secs: u64,
    /// How often the idle sweep runs.
    pub sweep_interval_secs: u64,
}

impl RateLimitSettings {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub filter: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<String>,
}

impl Settings {
    /// Rejects values that would make the service unsafe or unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "jwt.secret must be set (or JWT_SECRET)".to_string(),
            ));
        }
        if self.jwt.token_ttl_hours <= 0 {
            return Err(ConfigError::ValidationError(
                "jwt.token_ttl_hours must be positive".to_string(),
            ));
        }
        if self.database.url.is_empty() {
            return Err(ConfigError::ValidationError(
                "database.url must be set (or DATABASE_URL)".to_string(),
            ));
        }
        if self.database.query_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "database.query_timeout_secs must be positive".to_string(),
            ));
        }
        if self.rate_limit.requests_per_second == 0 {
            return Err(ConfigError::ValidationError(
                "rate_limit.requests_per_second must be positive".to_string(),
            ));
        }
        if self.rate_limit.requests_per_second > MAX_REQUESTS_PER_SECOND {
            return Err(ConfigError::ValidationError(format!(
                "rate_limit.requests_per_second must be at most {MAX_REQUESTS_PER_SECOND}"
            )));
        }
        if self.rate_limit.sweep_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "rate_limit.sweep_interval_secs must be positive".to_string(),
            ));
        }
        self.server.socket_addr().map(|_| ())
    }
}

/// Command-line overrides for the `[server]` section.
#[cfg(feature = "clap")]
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ServerOverrides {
    /// Interface to bind, overriding `server.host`.
    #[arg(long)]
    pub host: Option<String>,
    /// Port to listen on, overriding `server.port`.
    #[arg(long, short)]
    pub port: Option<u16>,
}

#[cfg(feature = "clap")]
impl ServerOverrides {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
    }
}

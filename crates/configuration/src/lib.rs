use std::env;
use std::path::Path;

use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
#[cfg(feature = "clap")]
pub use settings::ServerOverrides;
pub use settings::{
    DatabaseSettings, JwtSettings, LogSettings, RateLimitSettings, ServerSettings, Settings,
    MAX_REQUESTS_PER_SECOND,
};

/// Environment variable prefix; `TRACKRECORD__SERVER__PORT=8080` sets `server.port`.
pub const ENV_PREFIX: &str = "TRACKRECORD";

/// Loads the application settings.
///
/// Sources, lowest precedence first: built-in defaults, the TOML file at
/// `path` (or an optional `config.toml` in the working directory),
/// `TRACKRECORD__*` environment variables, then the conventional
/// `DATABASE_URL` and `JWT_SECRET` variables.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("config").required(false),
    };

    let builder = config::Config::builder()
        .set_default("environment", "development")?
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 4000)?
        .set_default("database.url", "")?
        .set_default("database.max_connections", 25)?
        .set_default("database.query_timeout_secs", 3)?
        .set_default("jwt.secret", "")?
        .set_default("jwt.token_ttl_hours", 24)?
        .set_default("rate_limit.enabled", true)?
        .set_default("rate_limit.requests_per_second", 2)?
        .set_default("rate_limit.idle_timeout_secs", 180)?
        .set_default("rate_limit.sweep_interval_secs", 60)?
        .set_default("log.filter", "info")?
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("database.url", env::var("DATABASE_URL").ok())?
        .set_override_option("jwt.secret", env::var("JWT_SECRET").ok())?
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serial_test::serial;

    use super::*;

    fn clear_env() {
        // SAFETY: tests touching the environment are serialized.
        unsafe {
            env::remove_var("DATABASE_URL");
            env::remove_var("JWT_SECRET");
            env::remove_var("TRACKRECORD__SERVER__PORT");
            env::remove_var("TRACKRECORD__RATE_LIMIT__REQUESTS_PER_SECOND");
        }
    }

    #[test]
    #[serial]
    fn defaults_with_required_secrets_from_env() {
        clear_env();
        unsafe {
            env::set_var("DATABASE_URL", "postgres://localhost/trackrecord");
            env::set_var("JWT_SECRET", "test-secret");
        }

        let settings = load_settings(None).unwrap();
        assert_eq!(settings.server.port, 4000);
        assert_eq!(settings.database.query_timeout_secs, 3);
        assert_eq!(settings.rate_limit.requests_per_second, 2);
        assert_eq!(settings.rate_limit.idle_timeout_secs, 180);
        assert_eq!(settings.rate_limit.sweep_interval_secs, 60);
        assert!(settings.rate_limit.enabled);
        clear_env();
    }

    #[test]
    #[serial]
    fn prefixed_environment_overrides_file() {
        clear_env();
        let path = env::temp_dir().join(format!("trackrecord-config-{}.toml", std::process::id()));
        fs::write(
            &path,
            "[server]\nport = 5000\n[database]\nurl = \"postgres://db/app\"\n[jwt]\nsecret = \"from-file\"\n",
        )
        .unwrap();
        unsafe {
            env::set_var("TRACKRECORD__SERVER__PORT", "6000");
        }

        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.server.port, 6000);
        assert_eq!(settings.database.url, "postgres://db/app");
        assert_eq!(settings.jwt.secret, "from-file");
        clear_env();
        let _ = fs::remove_file(&path);
    }

    #[test]
    #[serial]
    fn missing_secret_is_rejected() {
        clear_env();
        unsafe {
            env::set_var("DATABASE_URL", "postgres://localhost/trackrecord");
        }
        let err = load_settings(None).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        clear_env();
    }

    #[test]
    #[serial]
    fn request_rate_must_leave_a_usable_refill_interval() {
        clear_env();
        unsafe {
            env::set_var("DATABASE_URL", "postgres://localhost/trackrecord");
            env::set_var("JWT_SECRET", "test-secret");
            env::set_var("TRACKRECORD__RATE_LIMIT__REQUESTS_PER_SECOND", "2000000000");
        }
        let err = load_settings(None).unwrap_err();
        assert!(
            matches!(&err, ConfigError::ValidationError(msg) if msg.contains("requests_per_second")),
            "{err}"
        );

        unsafe {
            env::set_var(
                "TRACKRECORD__RATE_LIMIT__REQUESTS_PER_SECOND",
                MAX_REQUESTS_PER_SECOND.to_string(),
            );
        }
        let settings = load_settings(None).unwrap();
        assert_eq!(settings.rate_limit.requests_per_second, MAX_REQUESTS_PER_SECOND);
        clear_env();
    }
}

//! Application configuration.
//!
//! Configuration is layered with figment, later sources overriding earlier ones:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. The YAML file named by `-f/--config` (default `config.yaml`, optional)
//! 3. `TODOCTL_`-prefixed environment variables, with `__` separating nested keys
//!    (e.g. `TODOCTL_DATABASE__POOL__MAX_CONNECTIONS=20`)
//! 4. `DATABASE_URL`, which replaces `database.url`
//!
//! ```yaml
//! port: 3001
//! database:
//!   url: sqlite://todoctl.db?mode=rwc
//! auth:
//!   tokens: ["change-me"]
//! log_format: json
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "TODOCTL_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// All fields have defaults, so an empty file (or no file) is valid apart
/// from the bearer tokens, which must be supplied.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Set from the `DATABASE_URL` environment variable; replaces `database.url`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
    pub limits: LimitsConfig,
    /// Console log output format
    pub log_format: LogFormat,
    /// Export traces over OTLP (configured through the standard `OTEL_*` variables)
    pub enable_otel_export: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            database_url: None,
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            cors: CorsConfig::default(),
            limits: LimitsConfig::default(),
            log_format: LogFormat::default(),
            enable_otel_export: false,
        }
    }
}

/// SQLite database settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Connection string, e.g. `sqlite://todoctl.db?mode=rwc` or `sqlite::memory:`
    pub url: String,
    pub pool: PoolSettings,
    /// Log every SQL statement at debug level
    pub log_statements: bool,
    /// Statements slower than this are logged at warn level
    pub slow_statement_threshold_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://todoctl.db?mode=rwc".to_string(),
            pool: PoolSettings::default(),
            log_statements: false,
            slow_statement_threshold_ms: 1000,
        }
    }
}

/// Connection pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections to maintain
    pub min_connections: u32,
    /// Maximum time to wait for a connection (seconds)
    pub acquire_timeout_secs: u64,
    /// Maximum idle time before closing a connection (seconds)
    pub idle_timeout_secs: u64,
    /// Maximum lifetime of a connection (seconds)
    pub max_lifetime_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

/// Bearer token authentication.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Tokens accepted in `Authorization: Bearer <token>`
    pub tokens: Vec<String>,
}

// Config is logged at startup; keep the secrets out of it.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("tokens", &format_args!("[{} redacted]", self.tokens.len()))
            .finish()
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
///
/// No layer is installed while `allowed_origins` is empty.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

/// A single allowed CORS origin.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://app.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self { max_body_size: 1024 * 1024 }
    }
}

/// Console log format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl Config {
    /// Load configuration from the file named in `args`, the environment and `DATABASE_URL`, then validate it.
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        if let Some(url) = config.database_url.take() {
            config.database.url = url;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.auth.tokens.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: auth.tokens is empty, so no request could ever authenticate. \
                 Add at least one token to the config file or set TODOCTL_AUTH__TOKENS."
                    .to_string(),
            });
        }

        if self.auth.tokens.iter().any(|token| token.trim().is_empty()) {
            return Err(Error::Internal {
                operation: "Config validation: auth.tokens must not contain blank tokens".to_string(),
            });
        }

        if self.database.url.trim().is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: database.url must not be empty".to_string(),
            });
        }

        let pool = &self.database.pool;
        if pool.max_connections == 0 || pool.min_connections > pool.max_connections {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: invalid pool sizes: min_connections ({}) must not exceed max_connections ({}), which must be at least 1",
                    pool.min_connections, pool.max_connections
                ),
            });
        }

        if self.cors.allow_credentials && self.cors.allowed_origins.contains(&CorsOrigin::Wildcard) {
            return Err(Error::Internal {
                operation: "Config validation: cors.allow_credentials cannot be combined with a '*' origin".to_string(),
            });
        }

        if self.limits.max_body_size == 0 {
            return Err(Error::Internal {
                operation: "Config validation: limits.max_body_size must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can override specific values
            .merge(Env::prefixed("TODOCTL_").ignore(&["config"]).split("__"))
            // Common DATABASE_URL pattern
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args() -> Args {
        Args {
            config: "test.yaml".to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_file_values_and_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
port: 9000
auth:
  tokens: ["secret"]
database:
  url: "sqlite::memory:"
  pool:
    max_connections: 4
log_format: json
"#,
            )?;

            let config = Config::load(&args())?;

            assert_eq!(config.port, 9000);
            assert_eq!(config.host, "0.0.0.0");
            assert_eq!(config.bind_address(), "0.0.0.0:9000");
            assert_eq!(config.auth.tokens, vec!["secret".to_string()]);
            assert_eq!(config.database.url, "sqlite::memory:");
            assert_eq!(config.database.pool.max_connections, 4);
            assert_eq!(config.database.pool.acquire_timeout_secs, 30);
            assert_eq!(config.log_format, LogFormat::Json);
            assert!(!config.enable_otel_export);
            assert!(config.cors.allowed_origins.is_empty());

            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "port: 9000\nauth:\n  tokens: [\"secret\"]\n")?;
            jail.set_env("TODOCTL_HOST", "127.0.0.1");
            jail.set_env("TODOCTL_PORT", "8080");
            jail.set_env("TODOCTL_DATABASE__POOL__MAX_CONNECTIONS", "3");
            jail.set_env("TODOCTL_CONFIG", "test.yaml");

            let config = Config::load(&args())?;

            assert_eq!(config.bind_address(), "127.0.0.1:8080");
            assert_eq!(config.database.pool.max_connections, 3);

            Ok(())
        });
    }

    #[test]
    fn test_database_url_env_replaces_configured_url() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                "auth:\n  tokens: [\"secret\"]\ndatabase:\n  url: sqlite://from-file.db\n  log_statements: true\n",
            )?;
            jail.set_env("DATABASE_URL", "sqlite://from-env.db");

            let config = Config::load(&args())?;

            assert_eq!(config.database.url, "sqlite://from-env.db");
            assert!(config.database.log_statements);
            assert!(config.database_url.is_none());

            Ok(())
        });
    }

    #[test]
    fn test_missing_tokens_fail_validation() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "port: 9000\n")?;

            let err = Config::load(&args()).unwrap_err();
            assert!(err.to_string().contains("auth.tokens"));

            Ok(())
        });
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "auth:\n  tokens: [\"secret\"]\nprot: 9000\n")?;

            assert!(Config::load(&args()).is_err());

            Ok(())
        });
    }

    #[test]
    fn test_cors_origins() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
auth:
  tokens: ["secret"]
cors:
  allowed_origins: ["*", "https://app.example.com"]
  max_age: 600
"#,
            )?;

            let config = Config::load(&args())?;
            assert_eq!(config.cors.allowed_origins.len(), 2);
            assert_eq!(config.cors.allowed_origins[0], CorsOrigin::Wildcard);
            assert!(matches!(&config.cors.allowed_origins[1], CorsOrigin::Url(url) if url.host_str() == Some("app.example.com")));
            assert_eq!(config.cors.max_age, Some(600));

            Ok(())
        });
    }

    #[test]
    fn test_wildcard_with_credentials_is_rejected() {
        let mut config = Config::default();
        config.auth.tokens = vec!["secret".to_string()];
        config.cors.allowed_origins = vec![CorsOrigin::Wildcard];
        config.cors.allow_credentials = true;

        assert!(config.validate().is_err());

        config.cors.allow_credentials = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_token_is_rejected() {
        let mut config = Config::default();
        config.auth.tokens = vec!["ok".to_string(), "  ".to_string()];

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_output_redacts_tokens() {
        let mut config = Config::default();
        config.auth.tokens = vec!["super-secret".to_string()];

        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("1 redacted"));
    }
}
